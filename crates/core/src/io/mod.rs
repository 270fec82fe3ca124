//! Reading frames and writing analysis outputs

pub mod csv;
mod native;

pub use self::csv::{write_pixel_csv, write_pixel_rows, CSV_HEADER};
pub use native::{
    read_frame, read_frame_from_buffer, read_stack, write_mask_frame, write_mask_frame_to_buffer,
};
