//! Screensaver image rotation

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

/// Picks the image shown while the screen is blanked
#[derive(Debug)]
pub struct Screensaver {
    images: Vec<String>,
    last: Option<usize>,
    rng: StdRng,
}

impl Default for Screensaver {
    fn default() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }
}

impl Screensaver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Screensaver with a fixed random sequence
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            images: Vec::new(),
            last: None,
            rng,
        }
    }

    /// Replace the image set
    pub fn set_images(&mut self, images: Vec<String>) {
        debug!("Screensaver has {} images", images.len());
        self.images = images;
        self.last = None;
    }

    pub fn images(&self) -> &[String] {
        &self.images
    }

    /// Choose the next image. With more than one image loaded the previous
    /// choice is never repeated.
    pub fn pick(&mut self) -> Option<&str> {
        let index = match (self.images.len(), self.last) {
            (0, _) => return None,
            (1, _) => 0,
            (n, None) => self.rng.gen_range(0..n),
            (n, Some(last)) => {
                let i = self.rng.gen_range(0..n - 1);
                if i >= last {
                    i + 1
                } else {
                    i
                }
            }
        };
        self.last = Some(index);
        self.images.get(index).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_never_repeats() {
        let mut saver = Screensaver::seeded(7);
        saver.set_images(vec!["a".into(), "b".into(), "c".into()]);
        let mut prev = saver.pick().map(str::to_string);
        for _ in 0..200 {
            let next = saver.pick().map(str::to_string);
            assert_ne!(next, prev);
            prev = next;
        }
    }

    #[test]
    fn test_small_sets() {
        let mut saver = Screensaver::seeded(1);
        assert_eq!(saver.pick(), None);
        saver.set_images(vec!["only".into()]);
        assert_eq!(saver.pick(), Some("only"));
        assert_eq!(saver.pick(), Some("only"));
    }

    #[test]
    fn test_two_images_alternate() {
        let mut saver = Screensaver::seeded(3);
        saver.set_images(vec!["a".into(), "b".into()]);
        let first = saver.pick().map(str::to_string);
        let second = saver.pick().map(str::to_string);
        let third = saver.pick().map(str::to_string);
        assert_ne!(first, second);
        assert_eq!(first, third);
    }
}
