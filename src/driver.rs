//! SBIG camera implementation over the SBIGUDrv universal driver.
//!
//! Only compiled with the `sbig_hardware` feature, which links the vendor
//! driver through the `sbigudrv-sys` crate.

use std::time::Duration;

use chrono::Utc;
use sbigudrv_sys as sys;

use crate::abort::AbortToken;
use crate::image::Image;
use crate::traits::{Binning, Camera, CameraError, CameraInfo, Result, Window};

/// Poll period while waiting for integration to complete.
const STATUS_POLL: Duration = Duration::from_millis(50);

/// Camera backed by the vendor SBIGUDrv driver.
///
/// Owns the driver handle; dropping the camera closes the device and
/// unloads the driver.
pub struct SbigCamera {
    info: CameraInfo,
    binning: Binning,
    window: Window,
    full_frame: Window,
}

impl SbigCamera {
    /// Open the first USB-attached SBIG camera and establish the link.
    pub fn open() -> Result<Self> {
        sys::command::<(), ()>(sys::CC_OPEN_DRIVER, None, None).map_err(driver_error)?;

        let mut open = sys::OpenDeviceParams {
            device_type: sys::DEV_USB,
            lpt_base_address: 0,
            ip_address: 0,
        };
        sys::command(sys::CC_OPEN_DEVICE, Some(&mut open), None::<&mut ()>)
            .map_err(|code| close_driver_after(driver_error(code)))?;

        let mut link = sys::EstablishLinkParams { sbig_use_only: 0 };
        let mut link_results = sys::EstablishLinkResults { camera_type: 0 };
        sys::command(
            sys::CC_ESTABLISH_LINK,
            Some(&mut link),
            Some(&mut link_results),
        )
        .map_err(|code| close_all_after(driver_error(code)))?;

        let (model, full_frame) = query_ccd_info()?;
        tracing::info!(%model, width = full_frame.width, height = full_frame.height, "linked SBIG camera");

        Ok(Self {
            info: CameraInfo {
                model,
                serial: String::new(),
                driver: "sbigudrv".to_owned(),
            },
            binning: Binning::UNBINNED,
            window: full_frame,
            full_frame,
        })
    }

    /// Full imaging area reported by the CCD.
    #[must_use]
    pub const fn full_frame(&self) -> Window {
        self.full_frame
    }
}

impl Drop for SbigCamera {
    fn drop(&mut self) {
        let _ = sys::command::<(), ()>(sys::CC_CLOSE_DEVICE, None, None);
        let _ = sys::command::<(), ()>(sys::CC_CLOSE_DRIVER, None, None);
    }
}

impl Camera for SbigCamera {
    fn info(&self) -> &CameraInfo {
        &self.info
    }

    fn binning(&self) -> Result<Binning> {
        Ok(self.binning)
    }

    fn set_binning(&mut self, binning: Binning) -> Result<()> {
        // validates the mode is one the readout electronics support
        readout_mode_for(binning)?;
        self.binning = binning;
        Ok(())
    }

    fn window(&self) -> Result<Window> {
        Ok(self.window)
    }

    fn set_window(&mut self, window: Window) -> Result<()> {
        if window.width == 0 || window.height == 0 {
            return Err(CameraError::Unsupported(
                "readout window must be non-empty".to_owned(),
            ));
        }
        if window.left + window.width > self.full_frame.width
            || window.top + window.height > self.full_frame.height
        {
            return Err(CameraError::Unsupported(format!(
                "window exceeds the {}x{} imaging area",
                self.full_frame.width, self.full_frame.height
            )));
        }
        self.window = window;
        Ok(())
    }

    fn expose(
        &mut self,
        exposure: Duration,
        open_shutter: bool,
        abort: &AbortToken,
    ) -> Result<Image> {
        let start = Utc::now();
        let readout_mode = readout_mode_for(self.binning)?;

        let width = u16::try_from(self.window.width / self.binning.x)
            .map_err(|_| CameraError::Unsupported("window too wide".to_owned()))?;
        let height = u16::try_from(self.window.height / self.binning.y)
            .map_err(|_| CameraError::Unsupported("window too tall".to_owned()))?;
        let left = u16::try_from(self.window.left / self.binning.x)
            .map_err(|_| CameraError::Unsupported("window offset too large".to_owned()))?;
        let top = u16::try_from(self.window.top / self.binning.y)
            .map_err(|_| CameraError::Unsupported("window offset too large".to_owned()))?;

        // SBIGUDrv counts exposure time in hundredths of a second
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let hundredths = ((exposure.as_secs_f64() * 100.0).round() as u32).max(1);

        let mut params = sys::StartExposureParams2 {
            ccd: sys::CCD_IMAGING,
            exposure_time: hundredths,
            abg_state: sys::ABG_LOW7,
            open_shutter: if open_shutter {
                sys::SC_OPEN_SHUTTER
            } else {
                sys::SC_CLOSE_SHUTTER
            },
            readout_mode,
            top,
            left,
            height,
            width,
        };
        sys::command(sys::CC_START_EXPOSURE2, Some(&mut params), None::<&mut ()>)
            .map_err(driver_error)?;

        // wait for integration, honoring the abort token
        loop {
            if abort.is_aborted() {
                end_exposure();
                return Err(CameraError::Aborted);
            }

            let mut query = sys::QueryCommandStatusParams {
                command: sys::CC_START_EXPOSURE2,
            };
            let mut status = sys::QueryCommandStatusResults { status: 0 };
            sys::command(
                sys::CC_QUERY_COMMAND_STATUS,
                Some(&mut query),
                Some(&mut status),
            )
            .map_err(driver_error)?;

            if status.status & sys::STATUS_CCD_MASK == sys::STATUS_CCD_MASK {
                break;
            }
            std::thread::sleep(STATUS_POLL);
        }

        let mut end = sys::EndExposureParams {
            ccd: sys::CCD_IMAGING,
        };
        sys::command(sys::CC_END_EXPOSURE, Some(&mut end), None::<&mut ()>)
            .map_err(driver_error)?;

        // line-by-line readout
        let mut data = Vec::with_capacity(usize::from(width) * usize::from(height));
        let mut line = vec![0_u16; usize::from(width)];
        for _ in 0..height {
            if abort.is_aborted() {
                end_readout();
                return Err(CameraError::Aborted);
            }
            let mut line_params = sys::ReadoutLineParams {
                ccd: sys::CCD_IMAGING,
                readout_mode,
                pixel_start: left,
                pixel_length: width,
            };
            sys::readout_line(&mut line_params, &mut line).map_err(driver_error)?;
            data.extend_from_slice(&line);
        }
        end_readout();

        let mut image = Image::new(u32::from(width), u32::from(height), data);
        image.stamp_exposure_cards(
            &self.info,
            exposure,
            open_shutter,
            self.binning,
            self.window,
            start,
        );
        Ok(image)
    }
}

/// SBIG readout modes encode the binning: 0 is 1x1, 1 is 2x2, 2 is 3x3.
fn readout_mode_for(binning: Binning) -> Result<u16> {
    match (binning.x, binning.y) {
        (1, 1) => Ok(0),
        (2, 2) => Ok(1),
        (3, 3) => Ok(2),
        _ => Err(CameraError::Unsupported(format!(
            "readout electronics support 1x1, 2x2 and 3x3 binning, not {binning}"
        ))),
    }
}

fn query_ccd_info() -> Result<(String, Window)> {
    let mut params = sys::GetCcdInfoParams {
        request: sys::CCD_INFO_IMAGING,
    };
    let mut results = sys::GetCcdInfoResults0 {
        firmware_version: 0,
        camera_type: 0,
        name: [0; 64],
        readout_modes: 0,
        readout_info: [sys::ReadoutInfo {
            mode: 0,
            width: 0,
            height: 0,
            gain: 0,
            pixel_width: 0,
            pixel_height: 0,
        }; 20],
    };
    sys::command(sys::CC_GET_CCD_INFO, Some(&mut params), Some(&mut results))
        .map_err(|code| close_all_after(driver_error(code)))?;

    let name_len = results.name.iter().position(|&b| b == 0).unwrap_or(64);
    let model = String::from_utf8_lossy(&results.name[..name_len]).into_owned();

    // unbinned geometry is readout mode 0
    let unbinned = results.readout_info[0];
    let full_frame = Window::new(0, 0, u32::from(unbinned.width), u32::from(unbinned.height));
    Ok((model, full_frame))
}

fn end_exposure() {
    let mut end = sys::EndExposureParams {
        ccd: sys::CCD_IMAGING,
    };
    let _ = sys::command(sys::CC_END_EXPOSURE, Some(&mut end), None::<&mut ()>);
}

fn end_readout() {
    let mut end = sys::EndExposureParams {
        ccd: sys::CCD_IMAGING,
    };
    let _ = sys::command(sys::CC_END_READOUT, Some(&mut end), None::<&mut ()>);
}

fn close_driver_after(error: CameraError) -> CameraError {
    let _ = sys::command::<(), ()>(sys::CC_CLOSE_DRIVER, None, None);
    error
}

fn close_all_after(error: CameraError) -> CameraError {
    let _ = sys::command::<(), ()>(sys::CC_CLOSE_DEVICE, None, None);
    close_driver_after(error)
}

/// Turn a raw driver status into a [`CameraError`], asking the driver for
/// the matching error text when it can provide one.
fn driver_error(code: i16) -> CameraError {
    let error_no = u16::try_from(code.max(0)).unwrap_or(0);
    let mut params = sys::GetErrorStringParams { error_no };
    let mut results = sys::GetErrorStringResults {
        error_string: [0; 64],
    };
    let message = if sys::command(
        sys::CC_GET_ERROR_STRING,
        Some(&mut params),
        Some(&mut results),
    )
    .is_ok()
    {
        let len = results
            .error_string
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(64);
        String::from_utf8_lossy(&results.error_string[..len]).into_owned()
    } else {
        "unknown driver error".to_owned()
    };
    CameraError::Driver { code, message }
}
