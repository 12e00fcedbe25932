use h264::SliceHeader;

/// The part of a frame a picture covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PictureField {
    /// Both fields.
    #[default]
    Frame,
    /// The top field only.
    TopField,
    /// The bottom field only.
    BottomField,
}

impl PictureField {
    /// The field coded by a slice with this header.
    pub const fn from_slice_header(header: &SliceHeader) -> Self {
        match (header.field_pic_flag, header.bottom_field_flag) {
            (false, _) => Self::Frame,
            (true, false) => Self::TopField,
            (true, true) => Self::BottomField,
        }
    }
}

/// How a picture is marked in the DPB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Reference {
    /// Not used for reference.
    #[default]
    None,
    /// Short term reference.
    ShortTerm,
    /// Long term reference.
    LongTerm,
}

/// A picture as seen by the accelerator.
///
/// Holds the surface it decodes into plus the values the reference picture
/// lists need. Picture order counts and marking come from the caller's DPB
/// management.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct H264Picture<S> {
    pub(crate) surface: Option<S>,
    /// `frame_num`
    pub frame_num: u16,
    /// `LongTermFrameIdx`, used when [`Reference::LongTerm`].
    pub long_term_frame_idx: u16,
    /// `TopFieldOrderCnt`
    pub top_field_order_cnt: i32,
    /// `BottomFieldOrderCnt`
    pub bottom_field_order_cnt: i32,
    /// Field or frame.
    pub field: PictureField,
    /// Reference marking.
    pub reference: Reference,
    /// A frame inferred for a gap in `frame_num`.
    pub nonexisting: bool,
    /// The second field of a complementary pair.
    pub second_field: bool,
}

impl<S> Default for H264Picture<S> {
    fn default() -> Self {
        Self {
            surface: None,
            frame_num: 0,
            long_term_frame_idx: 0,
            top_field_order_cnt: 0,
            bottom_field_order_cnt: 0,
            field: PictureField::Frame,
            reference: Reference::None,
            nonexisting: false,
            second_field: false,
        }
    }
}

impl<S> H264Picture<S> {
    /// A picture for the slice with `header`, marked as a short term
    /// reference when `nal_ref_idc` is not zero.
    pub fn from_slice_header(header: &SliceHeader, nal_ref_idc: u8) -> Self {
        Self {
            frame_num: header.frame_num,
            field: PictureField::from_slice_header(header),
            reference: if nal_ref_idc != 0 {
                Reference::ShortTerm
            } else {
                Reference::None
            },
            ..Default::default()
        }
    }

    /// The surface assigned by `new_picture` or `duplicate_picture`.
    pub fn surface(&self) -> Option<&S> {
        self.surface.as_ref()
    }

    /// Drops the surface, giving it back to the device.
    pub fn take_surface(&mut self) -> Option<S> {
        self.surface.take()
    }

    /// True for short and long term references.
    pub const fn is_ref(&self) -> bool {
        !matches!(self.reference, Reference::None)
    }

    /// True for long term references.
    pub const fn is_long_term_ref(&self) -> bool {
        matches!(self.reference, Reference::LongTerm)
    }

    /// `PicOrderCnt()` of the picture.
    pub fn pic_order_cnt(&self) -> i32 {
        match self.field {
            PictureField::Frame => self.top_field_order_cnt.min(self.bottom_field_order_cnt),
            PictureField::TopField => self.top_field_order_cnt,
            PictureField::BottomField => self.bottom_field_order_cnt,
        }
    }
}

/// A DPB entry passed to `start_picture`.
#[derive(Debug)]
pub struct DpbPicture<'a, S> {
    /// The picture, or the first field of a pair.
    pub picture: &'a H264Picture<S>,
    /// The second field when both fields are decoded.
    pub other_field: Option<&'a H264Picture<S>>,
}

impl<S> Clone for DpbPicture<'_, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S> Copy for DpbPicture<'_, S> {}

impl<'a, S> DpbPicture<'a, S> {
    /// A frame or a lone field.
    pub const fn new(picture: &'a H264Picture<S>) -> Self {
        Self {
            picture,
            other_field: None,
        }
    }

    /// A complementary field pair.
    pub const fn with_other_field(picture: &'a H264Picture<S>, other_field: &'a H264Picture<S>) -> Self {
        Self {
            picture,
            other_field: Some(other_field),
        }
    }
}
