use bytes_util::BitReader;
use expgolomb::BitReaderExpGolombExt;

use crate::error::{ParserError, ParserResult};

/// Largest `view_id`.
pub const MAX_VIEW_ID: u32 = 1023;
/// Largest number of views.
pub const MAX_VIEW_COUNT: u32 = 1024;

/// Per view inter-view references.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpsMvcView {
    /// `view_id[i]`
    pub view_id: u16,
    /// `anchor_ref_l0[i]`, at most 15 entries.
    pub anchor_ref_l0: Vec<u16>,
    /// `anchor_ref_l1[i]`, at most 15 entries.
    pub anchor_ref_l1: Vec<u16>,
    /// `non_anchor_ref_l0[i]`, at most 15 entries.
    pub non_anchor_ref_l0: Vec<u16>,
    /// `non_anchor_ref_l1[i]`, at most 15 entries.
    pub non_anchor_ref_l1: Vec<u16>,
}

/// An operation point a level applies to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpsMvcOperationPoint {
    /// `applicable_op_temporal_id` (3 bits)
    pub temporal_id: u8,
    /// `applicable_op_target_view_id`
    pub target_view_id: Vec<u16>,
    /// `applicable_op_num_views_minus1`
    pub num_views_minus1: u16,
}

/// A signalled level and its operation points.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpsMvcLevelValue {
    /// `level_idc[i]`
    pub level_idc: u8,
    /// `num_applicable_ops_minus1 + 1` entries.
    pub applicable_op: Vec<SpsMvcOperationPoint>,
}

/// `seq_parameter_set_mvc_extension()`
///
/// ISO/IEC-14496-10-2022 - H.7.3.2.1.4
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpsMvcExtension {
    /// `num_views_minus1 + 1` entries. The first view has no references.
    pub views: Vec<SpsMvcView>,
    /// `num_level_values_signalled_minus1 + 1` entries.
    pub level_values: Vec<SpsMvcLevelValue>,
}

fn read_bounded(reader: &mut BitReader, max: u32) -> ParserResult<u32> {
    let value = reader.read_exp_golomb()?;
    if value > max {
        return Err(ParserError::invalid(format!("value out of range [0, {max}]: {value}")));
    }
    Ok(value)
}

fn read_view_list(reader: &mut BitReader) -> ParserResult<Vec<u16>> {
    let count = read_bounded(reader, 15)?;
    (0..count)
        .map(|_| read_bounded(reader, MAX_VIEW_ID).map(|id| id as u16))
        .collect()
}

impl SpsMvcExtension {
    /// Reads the extension that follows the SPS data in an MVC subset SPS.
    pub fn parse(reader: &mut BitReader) -> ParserResult<Self> {
        if !reader.read_bit()? {
            return Err(ParserError::invalid("bit_equal_to_one is 0"));
        }

        let num_views_minus1 = read_bounded(reader, MAX_VIEW_COUNT - 1)?;
        let mut views = Vec::with_capacity(num_views_minus1 as usize + 1);
        for _ in 0..=num_views_minus1 {
            views.push(SpsMvcView {
                view_id: read_bounded(reader, MAX_VIEW_ID)? as u16,
                ..Default::default()
            });
        }

        for view in views.iter_mut().skip(1) {
            view.anchor_ref_l0 = read_view_list(reader)?;
            view.anchor_ref_l1 = read_view_list(reader)?;
        }

        for view in views.iter_mut().skip(1) {
            view.non_anchor_ref_l0 = read_view_list(reader)?;
            view.non_anchor_ref_l1 = read_view_list(reader)?;
        }

        let num_level_values_signalled_minus1 = read_bounded(reader, 63)?;
        let mut level_values = Vec::with_capacity(num_level_values_signalled_minus1 as usize + 1);
        for _ in 0..=num_level_values_signalled_minus1 {
            let level_idc = reader.read_u8()?;
            let num_applicable_ops_minus1 = read_bounded(reader, 1023)?;

            let mut applicable_op = Vec::with_capacity(num_applicable_ops_minus1 as usize + 1);
            for _ in 0..=num_applicable_ops_minus1 {
                let temporal_id = reader.read_bits(3)? as u8;
                let num_target_views_minus1 = read_bounded(reader, 1023)?;
                let target_view_id = (0..=num_target_views_minus1)
                    .map(|_| read_bounded(reader, MAX_VIEW_ID).map(|id| id as u16))
                    .collect::<ParserResult<Vec<_>>>()?;
                let num_views_minus1 = read_bounded(reader, 1023)? as u16;

                applicable_op.push(SpsMvcOperationPoint {
                    temporal_id,
                    target_view_id,
                    num_views_minus1,
                });
            }

            level_values.push(SpsMvcLevelValue {
                level_idc,
                applicable_op,
            });
        }

        Ok(Self { views, level_values })
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use bytes_util::{BitReader, BitWriter};
    use expgolomb::BitWriterExpGolombExt;

    use super::*;

    fn write_two_view_extension(writer: &mut BitWriter<Vec<u8>>) {
        writer.write_bit(true).unwrap();
        // two views, ids 0 and 1
        writer.write_exp_golomb(1).unwrap();
        writer.write_exp_golomb(0).unwrap();
        writer.write_exp_golomb(1).unwrap();
        // anchor refs of view 1: l0 = [0], l1 = []
        writer.write_exp_golomb(1).unwrap();
        writer.write_exp_golomb(0).unwrap();
        writer.write_exp_golomb(0).unwrap();
        // non anchor refs of view 1: l0 = [0], l1 = []
        writer.write_exp_golomb(1).unwrap();
        writer.write_exp_golomb(0).unwrap();
        writer.write_exp_golomb(0).unwrap();
        // one level, one op with both views
        writer.write_exp_golomb(0).unwrap();
        writer.write_bits(40, 8).unwrap();
        writer.write_exp_golomb(0).unwrap();
        writer.write_bits(0, 3).unwrap();
        writer.write_exp_golomb(1).unwrap();
        writer.write_exp_golomb(0).unwrap();
        writer.write_exp_golomb(1).unwrap();
        writer.write_exp_golomb(1).unwrap();
    }

    #[test]
    fn test_parse_mvc_extension() {
        let mut writer = BitWriter::<Vec<u8>>::default();
        write_two_view_extension(&mut writer);
        let data = writer.finish().unwrap();

        let mvc = SpsMvcExtension::parse(&mut BitReader::new(&data)).unwrap();
        assert_eq!(mvc.views.len(), 2);
        assert!(mvc.views[0].anchor_ref_l0.is_empty());
        assert_eq!(mvc.views[1].view_id, 1);
        assert_eq!(mvc.views[1].anchor_ref_l0, [0]);
        assert_eq!(mvc.views[1].non_anchor_ref_l0, [0]);
        assert_eq!(
            mvc.level_values,
            [SpsMvcLevelValue {
                level_idc: 40,
                applicable_op: vec![SpsMvcOperationPoint {
                    temporal_id: 0,
                    target_view_id: vec![0, 1],
                    num_views_minus1: 1,
                }],
            }]
        );
    }

    #[test]
    fn test_bit_equal_to_one() {
        assert!(SpsMvcExtension::parse(&mut BitReader::new(&[0x7f, 0xff])).is_err());
    }

    #[test]
    fn test_too_many_refs() {
        let mut writer = BitWriter::<Vec<u8>>::default();
        writer.write_bit(true).unwrap();
        writer.write_exp_golomb(1).unwrap();
        writer.write_exp_golomb(0).unwrap();
        writer.write_exp_golomb(1).unwrap();
        writer.write_exp_golomb(16).unwrap();
        writer.write_bits(0, 32).unwrap();
        let data = writer.finish().unwrap();

        assert!(SpsMvcExtension::parse(&mut BitReader::new(&data)).is_err());
    }
}
