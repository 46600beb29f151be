//! Driver - abstract browser automation collaborator
//!
//! Page objects never talk to a browser directly; they go through [`Driver`].
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  Driver (trait, synchronous)                                  │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌──────────────────────┐        ┌──────────────────────┐    │
//! │  │  ChromiumDriver      │        │  MockDriver          │    │
//! │  │  (feature "browser") │        │  (scripted DOM)      │    │
//! │  │  CDP via             │        │  unit + integration  │    │
//! │  │  chromiumoxide       │        │  tests, demo site    │    │
//! │  └──────────────────────┘        └──────────────────────┘    │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Element handles are the driver's associated [`Driver::Element`] type.
//! They stay valid only until the next navigation or DOM mutation; a
//! driver reports a detached handle as [`DriverError::StaleElement`].
//!
//! [`DriverError::StaleElement`]: crate::DriverError::StaleElement

use crate::locator::Locator;
use crate::result::DriverResult;

/// A live browser session owned by exactly one scenario.
///
/// All methods take `&mut self`: a session is never shared, and some
/// implementations advance internal state on every call.
pub trait Driver {
    /// Transient handle to a DOM element
    type Element;

    /// Navigate to `url` and wait for the driver's default load condition
    fn navigate(&mut self, url: &str) -> DriverResult<()>;

    /// All elements currently matching `locator`, in document order
    fn find_all(&mut self, locator: &Locator) -> DriverResult<Vec<Self::Element>>;

    /// Dispatch a click on the element
    fn click(&mut self, element: &Self::Element) -> DriverResult<()>;

    /// Clear the element's editable value
    fn clear(&mut self, element: &Self::Element) -> DriverResult<()>;

    /// Type `text` into the element
    fn type_text(&mut self, element: &Self::Element, text: &str) -> DriverResult<()>;

    /// Rendered text content of the element
    fn text(&mut self, element: &Self::Element) -> DriverResult<String>;

    /// Whether the element is rendered and visible
    fn is_displayed(&mut self, element: &Self::Element) -> DriverResult<bool>;

    /// Whether the element accepts input
    fn is_enabled(&mut self, element: &Self::Element) -> DriverResult<bool>;

    /// Whether a click would reach the element: visible, enabled, not obscured
    fn is_clickable(&mut self, element: &Self::Element) -> DriverResult<bool> {
        Ok(self.is_displayed(element)? && self.is_enabled(element)?)
    }

    /// URL of the current document
    fn current_url(&mut self) -> DriverResult<String>;

    /// Title of the current document
    fn title(&mut self) -> DriverResult<String>;

    /// PNG screenshot of the viewport
    fn screenshot(&mut self) -> DriverResult<Vec<u8>>;

    /// Serialized markup of the current document
    fn page_source(&mut self) -> DriverResult<String>;

    /// Shut the session down, releasing the browser process
    fn quit(&mut self) -> DriverResult<()>;
}

/// PNG file signature, the first eight bytes of every PNG screenshot
pub const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// Whether `data` starts with the PNG signature
#[must_use]
pub fn is_png(data: &[u8]) -> bool {
    data.starts_with(&PNG_SIGNATURE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::DriverError;

    /// Minimal driver exercising the default `is_clickable`
    struct FlagDriver {
        displayed: bool,
        enabled: bool,
    }

    impl Driver for FlagDriver {
        type Element = ();

        fn navigate(&mut self, _url: &str) -> DriverResult<()> {
            Ok(())
        }
        fn find_all(&mut self, _locator: &Locator) -> DriverResult<Vec<()>> {
            Ok(vec![()])
        }
        fn click(&mut self, _element: &()) -> DriverResult<()> {
            Ok(())
        }
        fn clear(&mut self, _element: &()) -> DriverResult<()> {
            Ok(())
        }
        fn type_text(&mut self, _element: &(), _text: &str) -> DriverResult<()> {
            Ok(())
        }
        fn text(&mut self, _element: &()) -> DriverResult<String> {
            Ok(String::new())
        }
        fn is_displayed(&mut self, _element: &()) -> DriverResult<bool> {
            Ok(self.displayed)
        }
        fn is_enabled(&mut self, _element: &()) -> DriverResult<bool> {
            Ok(self.enabled)
        }
        fn current_url(&mut self) -> DriverResult<String> {
            Ok("about:blank".to_string())
        }
        fn title(&mut self) -> DriverResult<String> {
            Ok(String::new())
        }
        fn screenshot(&mut self) -> DriverResult<Vec<u8>> {
            Ok(PNG_SIGNATURE.to_vec())
        }
        fn page_source(&mut self) -> DriverResult<String> {
            Ok(String::new())
        }
        fn quit(&mut self) -> DriverResult<()> {
            Err(DriverError::SessionClosed)
        }
    }

    #[test]
    fn test_default_clickable_requires_both_flags() {
        let cases = [
            (true, true, true),
            (true, false, false),
            (false, true, false),
            (false, false, false),
        ];
        for (displayed, enabled, expected) in cases {
            let mut driver = FlagDriver { displayed, enabled };
            assert_eq!(driver.is_clickable(&()).unwrap(), expected);
        }
    }

    #[test]
    fn test_png_signature() {
        assert!(is_png(&PNG_SIGNATURE));
        assert!(is_png(&[PNG_SIGNATURE.as_slice(), &[0, 1, 2]].concat()));
        assert!(!is_png(b"GIF89a"));
        assert!(!is_png(&[]));
    }
}
