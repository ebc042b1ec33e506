use std::ptr;
use std::sync::Arc;

use mobiclip::{Frame, FrameType, VlcTable};

pub struct MobiclipEncoder {
    inner: mobiclip::Encoder,
}

#[repr(C)]
pub struct MobiclipPacket {
    pub data: *const u8,
    pub size: usize,
    pub frame_number: u64,
    pub is_intra: i32,
}

/// Returns null when the dimensions are rejected.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mobiclip_encoder_new(
    quantizer: i32,
    width: u32,
    height: u32,
) -> *mut MobiclipEncoder {
    match mobiclip::Encoder::new(quantizer, width, height) {
        Ok(inner) => Box::into_raw(Box::new(MobiclipEncoder { inner })),
        Err(_) => ptr::null_mut(),
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn mobiclip_encoder_free(enc: *mut MobiclipEncoder) {
    if !enc.is_null() {
        drop(unsafe { Box::from_raw(enc) });
    }
}

/// Loads a coefficient VLC table asset. Returns 0 on success, -1 otherwise.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mobiclip_encoder_load_vlc_table(
    enc: *mut MobiclipEncoder,
    data: *const u8,
    len: usize,
) -> i32 {
    if enc.is_null() || data.is_null() {
        return -1;
    }

    let enc = unsafe { &mut *enc };
    let bytes = unsafe { std::slice::from_raw_parts(data, len) };

    match VlcTable::from_asset(bytes) {
        Ok(table) => {
            enc.inner.set_vlc_table(Arc::new(table));
            0
        }
        Err(_) => -1,
    }
}

/// Encodes one ARGB frame (B, G, R, A byte order) with `stride` bytes per
/// row. Returns null on failure; the session is left as it was.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mobiclip_encoder_encode_frame(
    enc: *mut MobiclipEncoder,
    argb: *const u8,
    len: usize,
    stride: usize,
) -> *mut MobiclipPacket {
    if enc.is_null() || argb.is_null() {
        return ptr::null_mut();
    }

    let enc = unsafe { &mut *enc };
    let data = unsafe { std::slice::from_raw_parts(argb, len) }.to_vec();

    let frame = match Frame::with_stride(enc.inner.width(), enc.inner.height(), stride, data) {
        Ok(frame) => frame,
        Err(_) => return ptr::null_mut(),
    };

    match enc.inner.encode_packet(frame) {
        Ok(packet) => {
            let is_intra = match packet.frame_type {
                FrameType::Intra => 1,
                FrameType::Prediction => 0,
            };

            let data_boxed = packet.data.into_boxed_slice();
            let size = data_boxed.len();
            let data_ptr = Box::into_raw(data_boxed) as *const u8;

            Box::into_raw(Box::new(MobiclipPacket {
                data: data_ptr,
                size,
                frame_number: packet.frame_number,
                is_intra,
            }))
        }
        Err(_) => ptr::null_mut(),
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn mobiclip_packet_free(pkt: *mut MobiclipPacket) {
    if pkt.is_null() {
        return;
    }

    let pkt = unsafe { Box::from_raw(pkt) };
    if !pkt.data.is_null() {
        unsafe {
            let slice_ptr = std::slice::from_raw_parts_mut(pkt.data as *mut u8, pkt.size);
            drop(Box::from_raw(slice_ptr as *mut [u8]));
        }
    }
}
