/// `slice_type` as defined in ISO/IEC 14496-10:2022 Table 7-6.
///
/// Values 5..=9 mean every slice of the picture has the same type, so they
/// fold onto 0..=4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SliceType {
    /// Predicted.
    #[default]
    P,
    /// Bi-predicted.
    B,
    /// Intra.
    I,
    /// Switching P.
    Sp,
    /// Switching I.
    Si,
}

impl SliceType {
    /// Maps a raw `slice_type` value.
    pub const fn from_raw(value: u32) -> Self {
        match value % 5 {
            0 => Self::P,
            1 => Self::B,
            2 => Self::I,
            3 => Self::Sp,
            _ => Self::Si,
        }
    }

    /// P slice
    pub const fn is_p(self) -> bool {
        matches!(self, Self::P)
    }

    /// B slice
    pub const fn is_b(self) -> bool {
        matches!(self, Self::B)
    }

    /// I slice
    pub const fn is_i(self) -> bool {
        matches!(self, Self::I)
    }

    /// SP slice
    pub const fn is_sp(self) -> bool {
        matches!(self, Self::Sp)
    }

    /// SI slice
    pub const fn is_si(self) -> bool {
        matches!(self, Self::Si)
    }

    /// True for slice types that never reference other pictures.
    pub const fn is_intra(self) -> bool {
        matches!(self, Self::I | Self::Si)
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::SliceType;

    #[test]
    fn test_from_raw_wraps() {
        assert_eq!(SliceType::from_raw(0), SliceType::P);
        assert_eq!(SliceType::from_raw(6), SliceType::B);
        assert_eq!(SliceType::from_raw(7), SliceType::I);
        assert_eq!(SliceType::from_raw(8), SliceType::Sp);
        assert_eq!(SliceType::from_raw(9), SliceType::Si);
        assert!(SliceType::from_raw(4).is_intra());
        assert!(!SliceType::from_raw(3).is_intra());
    }
}
