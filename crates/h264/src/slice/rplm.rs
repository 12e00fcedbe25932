use bytes_util::BitReader;
use expgolomb::BitReaderExpGolombExt;

use crate::error::{ParserError, ParserResult};
use crate::sps::read_ue_max;

/// Entries per list: 32 reference indices plus the terminating entry.
pub const MAX_REF_PIC_LIST_MODIFICATIONS: usize = 33;

/// One `modification_of_pic_nums_idc` operation.
///
/// Only the field selected by the idc is read, the others stay 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RefPicListModification {
    /// `modification_of_pic_nums_idc`, 0..=5. 3 ends the list.
    pub modification_of_pic_nums_idc: u8,
    /// `abs_diff_pic_num_minus1` for idc 0 and 1.
    pub abs_diff_pic_num_minus1: u32,
    /// `long_term_pic_num` for idc 2.
    pub long_term_pic_num: u32,
    /// `abs_diff_view_idx_minus1` for idc 4 and 5 in MVC slices.
    pub abs_diff_view_idx_minus1: u32,
}

/// `ref_pic_list_modification()` for one list.
///
/// ISO/IEC-14496-10-2022 - 7.3.3.1 and H.7.3.3.1.1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefPicListModifications {
    /// `ref_pic_list_modification_flag_lX`
    pub flag: bool,
    entries: [RefPicListModification; MAX_REF_PIC_LIST_MODIFICATIONS],
    len: usize,
}

impl Default for RefPicListModifications {
    fn default() -> Self {
        Self {
            flag: false,
            entries: [RefPicListModification::default(); MAX_REF_PIC_LIST_MODIFICATIONS],
            len: 0,
        }
    }
}

impl RefPicListModifications {
    /// The operations in bitstream order, terminator included.
    pub fn entries(&self) -> &[RefPicListModification] {
        &self.entries[..self.len]
    }

    fn push(&mut self, entry: RefPicListModification) -> ParserResult<()> {
        let slot = self.entries.get_mut(self.len).ok_or_else(|| {
            ParserError::invalid(format!(
                "more than {MAX_REF_PIC_LIST_MODIFICATIONS} reference picture list modifications"
            ))
        })?;

        *slot = entry;
        self.len += 1;
        Ok(())
    }

    /// Reads one list. `max_pic_num` bounds `abs_diff_pic_num_minus1`.
    pub(crate) fn parse(reader: &mut BitReader, max_pic_num: u32, is_mvc: bool) -> ParserResult<Self> {
        let mut list = Self {
            flag: reader.read_bit()?,
            ..Default::default()
        };

        if !list.flag {
            return Ok(list);
        }

        loop {
            let idc = read_ue_max(reader, 5)? as u8;
            let mut entry = RefPicListModification {
                modification_of_pic_nums_idc: idc,
                ..Default::default()
            };

            match idc {
                0 | 1 => entry.abs_diff_pic_num_minus1 = read_ue_max(reader, max_pic_num.saturating_sub(1))?,
                2 => entry.long_term_pic_num = reader.read_exp_golomb()?,
                4 | 5 if is_mvc => entry.abs_diff_view_idx_minus1 = reader.read_exp_golomb()?,
                _ => {}
            }

            list.push(entry)?;
            if idc == 3 {
                break;
            }
        }

        Ok(list)
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use bytes_util::BitWriter;
    use expgolomb::BitWriterExpGolombExt;

    use super::*;

    fn parse(build: impl FnOnce(&mut BitWriter<Vec<u8>>), max_pic_num: u32, is_mvc: bool) -> ParserResult<RefPicListModifications> {
        let mut writer = BitWriter::<Vec<u8>>::default();
        build(&mut writer);
        writer.write_rbsp_trailing_bits().unwrap();
        let data = writer.finish().unwrap();

        RefPicListModifications::parse(&mut BitReader::new(&data), max_pic_num, is_mvc)
    }

    #[test]
    fn test_absent() {
        let list = parse(|w| w.write_bit(false).unwrap(), 16, false).unwrap();
        assert!(!list.flag);
        assert!(list.entries().is_empty());
    }

    #[test]
    fn test_operations() {
        let list = parse(
            |w| {
                w.write_bit(true).unwrap();
                w.write_exp_golomb(0).unwrap();
                w.write_exp_golomb(15).unwrap();
                w.write_exp_golomb(2).unwrap();
                w.write_exp_golomb(7).unwrap();
                w.write_exp_golomb(3).unwrap();
            },
            16,
            false,
        )
        .unwrap();

        let entries = list.entries();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].abs_diff_pic_num_minus1, 15);
        assert_eq!(entries[1].long_term_pic_num, 7);
        assert_eq!(entries[2].modification_of_pic_nums_idc, 3);
    }

    #[test]
    fn test_abs_diff_bounded_by_max_pic_num() {
        let err = parse(
            |w| {
                w.write_bit(true).unwrap();
                w.write_exp_golomb(1).unwrap();
                w.write_exp_golomb(16).unwrap();
                w.write_exp_golomb(3).unwrap();
            },
            16,
            false,
        )
        .unwrap_err();
        assert!(matches!(err, ParserError::Error(_)));
    }

    #[test]
    fn test_view_index_only_for_mvc() {
        let build = |w: &mut BitWriter<Vec<u8>>| {
            w.write_bit(true).unwrap();
            w.write_exp_golomb(4).unwrap();
            w.write_exp_golomb(2).unwrap();
            w.write_exp_golomb(3).unwrap();
        };

        let mvc = parse(build, 16, true).unwrap();
        assert_eq!(mvc.entries().len(), 2);
        assert_eq!(mvc.entries()[0].abs_diff_view_idx_minus1, 2);

        // without MVC the ue(2) is taken as the next idc
        let plain = parse(build, 16, false).unwrap();
        assert_eq!(plain.entries().len(), 3);
        assert_eq!(plain.entries()[1].modification_of_pic_nums_idc, 2);
        assert_eq!(plain.entries()[1].long_term_pic_num, 0);
    }

    #[test]
    fn test_overflow_is_an_error() {
        let err = parse(
            |w| {
                w.write_bit(true).unwrap();
                for _ in 0..MAX_REF_PIC_LIST_MODIFICATIONS + 4 {
                    w.write_exp_golomb(0).unwrap();
                    w.write_exp_golomb(0).unwrap();
                }
                w.write_exp_golomb(3).unwrap();
            },
            16,
            false,
        )
        .unwrap_err();
        assert!(err.to_string().contains("reference picture list modifications"));
    }

    #[test]
    fn test_full_list_with_terminator() {
        let list = parse(
            |w| {
                w.write_bit(true).unwrap();
                for _ in 0..MAX_REF_PIC_LIST_MODIFICATIONS - 1 {
                    w.write_exp_golomb(1).unwrap();
                    w.write_exp_golomb(0).unwrap();
                }
                w.write_exp_golomb(3).unwrap();
            },
            16,
            false,
        )
        .unwrap();
        assert_eq!(list.entries().len(), MAX_REF_PIC_LIST_MODIFICATIONS);
    }
}
