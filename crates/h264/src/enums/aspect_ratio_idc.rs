use std::fmt;

/// `aspect_ratio_idc` as defined in ISO/IEC-14496-10-2022 - E.2.1 Table E-1.
///
/// Values 17..=254 are reserved. 255 (`EXTENDED_SAR`) means the ratio follows
/// in the bitstream as `sar_width`/`sar_height`.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
#[repr(transparent)]
pub struct AspectRatioIdc(pub u8);

/// Table E-1, indexed by `aspect_ratio_idc`.
const SAMPLE_ASPECT_RATIOS: [(u16, u16); 17] = [
    (0, 0),
    (1, 1),
    (12, 11),
    (10, 11),
    (16, 11),
    (40, 33),
    (24, 11),
    (20, 11),
    (32, 11),
    (80, 33),
    (18, 11),
    (15, 11),
    (64, 33),
    (160, 99),
    (4, 3),
    (3, 2),
    (2, 1),
];

impl AspectRatioIdc {
    /// 0: unspecified
    pub const UNSPECIFIED: Self = Self(0);
    /// 1: 1:1 ("square")
    pub const SQUARE: Self = Self(1);
    /// 255: explicit `sar_width:sar_height`
    pub const EXTENDED_SAR: Self = Self(255);

    /// Returns the `(par_n, par_d)` pair from Table E-1.
    ///
    /// `None` for reserved values and for [`Self::EXTENDED_SAR`], whose ratio
    /// has to be read from the bitstream.
    pub fn sample_aspect_ratio(self) -> Option<(u16, u16)> {
        SAMPLE_ASPECT_RATIOS.get(self.0 as usize).copied()
    }

    /// True for 17..=254.
    pub const fn is_reserved(self) -> bool {
        self.0 > 16 && self.0 < 255
    }
}

impl fmt::Debug for AspectRatioIdc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (*self, self.sample_aspect_ratio()) {
            (Self::UNSPECIFIED, _) => f.write_str("AspectRatioIdc::Unspecified"),
            (Self::EXTENDED_SAR, _) => f.write_str("AspectRatioIdc::ExtendedSar"),
            (_, Some((n, d))) => write!(f, "AspectRatioIdc::Aspect{n}_{d}"),
            (Self(v), None) => write!(f, "AspectRatioIdc::Reserved({v})"),
        }
    }
}

impl From<u8> for AspectRatioIdc {
    fn from(value: u8) -> Self {
        Self(value)
    }
}

impl From<AspectRatioIdc> for u8 {
    fn from(value: AspectRatioIdc) -> Self {
        value.0
    }
}
