//! Bindings for the SBIG Universal Driver (SBIGUDrv).
//!
//! The driver exposes a single entry point, `SBIGUnivDrvCommand`, taking a
//! command code plus untyped parameter and result blocks. Command codes and
//! struct layouts follow `sbigudrv.h`; only the subset needed for the
//! open/expose/readout path is declared here.
//!
//! The raw entry point is wrapped by [`command`] and [`readout_line`] so that
//! callers never handle pointers themselves. Both are only available with the
//! `sbig-sdk` feature, which also turns on linking against the vendor driver.

// Command codes from sbigudrv.h.
/// Start an exposure with a full readout geometry (`StartExposureParams2`).
pub const CC_START_EXPOSURE2: u16 = 50;
/// End the active exposure on a CCD.
pub const CC_END_EXPOSURE: u16 = 2;
/// Read one binned line from the CCD into the results buffer.
pub const CC_READOUT_LINE: u16 = 3;
/// Finish the readout and restore idle clocking.
pub const CC_END_READOUT: u16 = 25;
/// Query the progress of a previously issued command.
pub const CC_QUERY_COMMAND_STATUS: u16 = 12;
/// Establish the communication link to an opened device.
pub const CC_ESTABLISH_LINK: u16 = 9;
/// Query CCD geometry and identity.
pub const CC_GET_CCD_INFO: u16 = 11;
/// Translate a driver error code into text.
pub const CC_GET_ERROR_STRING: u16 = 16;
/// Load the driver.
pub const CC_OPEN_DRIVER: u16 = 17;
/// Unload the driver.
pub const CC_CLOSE_DRIVER: u16 = 18;
/// Open a physical device (USB, Ethernet, parallel port).
pub const CC_OPEN_DEVICE: u16 = 27;
/// Close the opened device.
pub const CC_CLOSE_DEVICE: u16 = 28;

/// Success status returned by the driver.
pub const CE_NO_ERROR: i16 = 0;

/// First USB device, for `OpenDeviceParams::device_type`.
pub const DEV_USB: u16 = 0x7F00;

/// Imaging CCD selector.
pub const CCD_IMAGING: u16 = 0;

/// Anti-blooming gate off during integration.
pub const ABG_LOW7: u16 = 0;

/// Leave the shutter in its current state.
pub const SC_LEAVE_SHUTTER: u16 = 0;
/// Open the shutter for the exposure (light frame).
pub const SC_OPEN_SHUTTER: u16 = 1;
/// Keep the shutter closed for the exposure (dark frame).
pub const SC_CLOSE_SHUTTER: u16 = 2;

/// `GetCCDInfoParams::request` value for the imaging CCD.
pub const CCD_INFO_IMAGING: u16 = 0;

/// Bits of `QueryCommandStatusResults::status` covering the imaging CCD;
/// both set means the integration is complete.
pub const STATUS_CCD_MASK: u16 = 0x3;

/// Exposure geometry for `CC_START_EXPOSURE2`. `exposure_time` is in
/// hundredths of a second; `top`/`left`/`width`/`height` are in binned pixels.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct StartExposureParams2 {
    pub ccd: u16,
    pub exposure_time: u32,
    pub abg_state: u16,
    pub open_shutter: u16,
    pub readout_mode: u16,
    pub top: u16,
    pub left: u16,
    pub height: u16,
    pub width: u16,
}

/// Parameters for `CC_END_EXPOSURE` and `CC_END_READOUT`.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct EndExposureParams {
    pub ccd: u16,
}

/// Parameters for `CC_READOUT_LINE`; the line lands in the results buffer.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct ReadoutLineParams {
    pub ccd: u16,
    pub readout_mode: u16,
    pub pixel_start: u16,
    pub pixel_length: u16,
}

/// Parameters for `CC_QUERY_COMMAND_STATUS`.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct QueryCommandStatusParams {
    pub command: u16,
}

/// Results of `CC_QUERY_COMMAND_STATUS`.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct QueryCommandStatusResults {
    pub status: u16,
}

/// Parameters for `CC_OPEN_DEVICE`.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct OpenDeviceParams {
    pub device_type: u16,
    pub lpt_base_address: u16,
    pub ip_address: u32,
}

/// Parameters for `CC_ESTABLISH_LINK`.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct EstablishLinkParams {
    pub sbig_use_only: u16,
}

/// Results of `CC_ESTABLISH_LINK`.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct EstablishLinkResults {
    pub camera_type: u16,
}

/// Per-readout-mode geometry inside `GetCcdInfoResults0`.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct ReadoutInfo {
    pub mode: u16,
    pub width: u16,
    pub height: u16,
    pub gain: u16,
    pub pixel_width: u32,
    pub pixel_height: u32,
}

/// Parameters for `CC_GET_CCD_INFO`.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct GetCcdInfoParams {
    pub request: u16,
}

/// Results of `CC_GET_CCD_INFO` with request 0 or 1.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct GetCcdInfoResults0 {
    pub firmware_version: u16,
    pub camera_type: u16,
    pub name: [u8; 64],
    pub readout_modes: u16,
    pub readout_info: [ReadoutInfo; 20],
}

/// Parameters for `CC_GET_ERROR_STRING`.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct GetErrorStringParams {
    pub error_no: u16,
}

/// Results of `CC_GET_ERROR_STRING`; `error_string` is NUL-terminated.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct GetErrorStringResults {
    pub error_string: [u8; 64],
}

#[cfg(feature = "sbig-sdk")]
mod ffi {
    use std::os::raw::c_void;

    extern "C" {
        pub fn SBIGUnivDrvCommand(
            command: i16,
            params: *mut c_void,
            results: *mut c_void,
        ) -> i16;
    }
}

/// Issue a driver command with typed parameter and result blocks.
///
/// Pass `None` for commands that take no parameters or produce no results,
/// turbofishing the unused slot to `()`. Returns the raw driver status on
/// failure.
#[cfg(feature = "sbig-sdk")]
pub fn command<P, R>(
    command: u16,
    params: Option<&mut P>,
    results: Option<&mut R>,
) -> Result<(), i16> {
    let params_ptr = params.map_or(std::ptr::null_mut(), |p| std::ptr::from_mut(p).cast());
    let results_ptr = results.map_or(std::ptr::null_mut(), |r| std::ptr::from_mut(r).cast());

    // SAFETY: both pointers are either null or derived from live exclusive
    // references to repr(C) blocks matching the command's expected layout.
    #[allow(clippy::cast_possible_wrap)]
    let status = unsafe { ffi::SBIGUnivDrvCommand(command as i16, params_ptr, results_ptr) };

    if status == CE_NO_ERROR {
        Ok(())
    } else {
        Err(status)
    }
}

/// Read one line of pixels into `buffer`.
///
/// `buffer` must hold at least `params.pixel_length` elements; the driver
/// writes the binned line directly into it.
#[cfg(feature = "sbig-sdk")]
pub fn readout_line(params: &mut ReadoutLineParams, buffer: &mut [u16]) -> Result<(), i16> {
    assert!(
        buffer.len() >= usize::from(params.pixel_length),
        "readout buffer shorter than pixel_length"
    );

    // SAFETY: the buffer is checked above to cover the driver's write span.
    #[allow(clippy::cast_possible_wrap)]
    let status = unsafe {
        ffi::SBIGUnivDrvCommand(
            CC_READOUT_LINE as i16,
            std::ptr::from_mut(params).cast(),
            buffer.as_mut_ptr().cast(),
        )
    };

    if status == CE_NO_ERROR {
        Ok(())
    } else {
        Err(status)
    }
}
