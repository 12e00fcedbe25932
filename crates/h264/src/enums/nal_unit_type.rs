/// NAL (Network Abstraction Layer) unit types as defined by ISO/IEC 14496-10:2022 (Table 7-1).
///
/// Every 5-bit value maps to a variant, so the conversion from the header byte
/// is total. Values the standard leaves open keep their raw number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NalUnitType {
    /// 0 and 24..=31: not used by the decoding process.
    Unspecified(u8),
    /// Coded slice of a non-IDR picture.
    Slice,
    /// Coded slice data partition A.
    SliceDataPartitionA,
    /// Coded slice data partition B.
    SliceDataPartitionB,
    /// Coded slice data partition C.
    SliceDataPartitionC,
    /// Coded slice of an IDR picture.
    SliceIdr,
    /// Supplemental enhancement information.
    Sei,
    /// Sequence parameter set.
    Sps,
    /// Picture parameter set.
    Pps,
    /// Access unit delimiter.
    AuDelimiter,
    /// End of sequence.
    SeqEnd,
    /// End of stream.
    StreamEnd,
    /// Filler data.
    FillerData,
    /// Sequence parameter set extension.
    SpsExtension,
    /// Prefix NAL unit (SVC/MVC).
    PrefixUnit,
    /// Subset sequence parameter set.
    SubsetSps,
    /// Depth parameter set.
    DepthParameterSet,
    /// 17, 18, 22 and 23.
    Reserved(u8),
    /// Coded slice of an auxiliary picture without partitioning.
    SliceAux,
    /// Coded slice extension (SVC/MVC).
    SliceExtension,
    /// Coded slice extension for depth views.
    SliceDepthExtension,
}

impl From<u8> for NalUnitType {
    /// Converts the low 5 bits of `value`.
    fn from(value: u8) -> Self {
        match value & 0x1f {
            1 => Self::Slice,
            2 => Self::SliceDataPartitionA,
            3 => Self::SliceDataPartitionB,
            4 => Self::SliceDataPartitionC,
            5 => Self::SliceIdr,
            6 => Self::Sei,
            7 => Self::Sps,
            8 => Self::Pps,
            9 => Self::AuDelimiter,
            10 => Self::SeqEnd,
            11 => Self::StreamEnd,
            12 => Self::FillerData,
            13 => Self::SpsExtension,
            14 => Self::PrefixUnit,
            15 => Self::SubsetSps,
            16 => Self::DepthParameterSet,
            19 => Self::SliceAux,
            20 => Self::SliceExtension,
            21 => Self::SliceDepthExtension,
            v @ (17 | 18 | 22 | 23) => Self::Reserved(v),
            v => Self::Unspecified(v),
        }
    }
}

impl From<NalUnitType> for u8 {
    fn from(value: NalUnitType) -> Self {
        match value {
            NalUnitType::Unspecified(v) | NalUnitType::Reserved(v) => v,
            NalUnitType::Slice => 1,
            NalUnitType::SliceDataPartitionA => 2,
            NalUnitType::SliceDataPartitionB => 3,
            NalUnitType::SliceDataPartitionC => 4,
            NalUnitType::SliceIdr => 5,
            NalUnitType::Sei => 6,
            NalUnitType::Sps => 7,
            NalUnitType::Pps => 8,
            NalUnitType::AuDelimiter => 9,
            NalUnitType::SeqEnd => 10,
            NalUnitType::StreamEnd => 11,
            NalUnitType::FillerData => 12,
            NalUnitType::SpsExtension => 13,
            NalUnitType::PrefixUnit => 14,
            NalUnitType::SubsetSps => 15,
            NalUnitType::DepthParameterSet => 16,
            NalUnitType::SliceAux => 19,
            NalUnitType::SliceExtension => 20,
            NalUnitType::SliceDepthExtension => 21,
        }
    }
}

impl NalUnitType {
    /// True for the VCL slice types 1 to 5.
    pub const fn is_slice(self) -> bool {
        matches!(
            self,
            Self::Slice
                | Self::SliceDataPartitionA
                | Self::SliceDataPartitionB
                | Self::SliceDataPartitionC
                | Self::SliceIdr
        )
    }

    /// True for the units that carry the 3-byte SVC/MVC header extension.
    pub const fn has_header_extension(self) -> bool {
        matches!(self, Self::PrefixUnit | Self::SliceExtension)
    }
}
