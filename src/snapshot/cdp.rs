//! Chrome DevTools Protocol capturer
//!
//! Launches headless Chrome, keeps a single tab, and screenshots one element
//! of a page per capture. File targets are delegated to [`FileCapturer`].

use super::{CaptureOptions, CaptureTarget, Capturer, FileCapturer, RasterImage};
use crate::{Error, Result, Viewport};
use headless_chrome::browser::tab::Tab;
use headless_chrome::protocol::cdp::{Emulation, Page, DOM};
use headless_chrome::{Browser, LaunchOptions};
use log::{debug, warn};
use std::sync::Arc;
use std::time::Duration;

/// CDP-based element capturer (uses the `headless_chrome` crate)
pub struct CdpCapturer {
    // Keeps the Chrome process alive for as long as the tab is used.
    _browser: Browser,
    tab: Arc<Tab>,
    files: FileCapturer,
    element_timeout: Duration,
}

impl CdpCapturer {
    pub fn new(viewport: Viewport, timeout_ms: u64) -> Result<Self> {
        let launch_options = LaunchOptions::default_builder()
            .headless(true)
            .window_size(Some((viewport.width, viewport.height)))
            .build()
            .map_err(|e| Error::SnapshotFailed(format!("Failed to build launch options: {}", e)))?;

        let browser = Browser::new(launch_options)?;
        let tab = browser.new_tab()?;

        let element_timeout = if timeout_ms == 0 {
            Duration::from_secs(30)
        } else {
            Duration::from_millis(timeout_ms)
        };

        Ok(Self {
            _browser: browser,
            tab,
            files: FileCapturer::new(),
            element_timeout,
        })
    }
}

impl Capturer for CdpCapturer {
    fn capture(&mut self, target: &CaptureTarget, options: &CaptureOptions) -> Result<RasterImage> {
        let (url, selector) = match target {
            CaptureTarget::File(_) => return self.files.capture(target, options),
            CaptureTarget::Element { url, selector } => (url, selector),
        };

        url::Url::parse(url)
            .map_err(|e| Error::CaptureTargetMissing(format!("invalid page url {}: {}", url, e)))?;

        self.tab.navigate_to(url)?.wait_until_navigated()?;

        if let Some(bg) = options.background {
            let color = DOM::RGBA {
                r: bg.r as u32,
                g: bg.g as u32,
                b: bg.b as u32,
                a: Some(1.0),
            };
            if let Err(e) = self
                .tab
                .call_method(Emulation::SetDefaultBackgroundColorOverride { color: Some(color) })
            {
                warn!("background override {} not applied: {}", bg, e);
            }
        }

        let element = self
            .tab
            .wait_for_element_with_custom_timeout(selector, self.element_timeout)
            .map_err(|_| Error::CaptureTargetMissing(format!("'{}' on {}", selector, url)))?;

        let png = element.capture_screenshot(Page::CaptureScreenshotFormatOption::Png)?;
        debug!("captured {} bytes from '{}' on {}", png.len(), selector, url);

        Ok(RasterImage::Encoded(png))
    }
}
