mod aspect_ratio_idc;
mod nal_unit_type;
mod slice_type;

pub use aspect_ratio_idc::AspectRatioIdc;
pub use nal_unit_type::NalUnitType;
pub use slice_type::SliceType;
