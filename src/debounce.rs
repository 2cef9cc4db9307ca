//! Hysteresis on the fingertip distance used for click gestures.

use serde::Serialize;

/// `[low, high]` distance band in frame pixels. Closing the fingers into the
/// open interval fires once; opening past `high` re-arms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClickBand {
    pub low: u32,
    pub high: u32,
}

impl Default for ClickBand {
    fn default() -> Self {
        Self { low: 23, high: 37 }
    }
}

/// Returns `(fire, clicked)`. At or below `low` is a dead zone: it neither
/// fires nor re-arms.
pub fn evaluate(distance: f64, band: ClickBand, clicked: bool) -> (bool, bool) {
    let low = f64::from(band.low);
    let high = f64::from(band.high);
    if low < distance && distance < high {
        if clicked { (false, true) } else { (true, true) }
    } else if distance > high {
        (false, false)
    } else {
        (false, clicked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(distances: &[f64]) -> Vec<usize> {
        let band = ClickBand::default();
        let mut clicked = false;
        let mut fired = vec![];
        for (i, d) in distances.iter().enumerate() {
            let (fire, next) = evaluate(*d, band, clicked);
            clicked = next;
            if fire {
                fired.push(i);
            }
        }
        fired
    }

    #[test]
    fn fires_once_per_closure() {
        assert_eq!(run(&[50.0, 30.0, 30.0, 30.0, 50.0, 30.0]), vec![1, 5]);
    }

    #[test]
    fn dead_zone_does_not_rearm() {
        assert_eq!(run(&[30.0, 15.0, 30.0]), vec![0]);
    }

    #[test]
    fn band_edges_are_exclusive() {
        let band = ClickBand::default();
        assert_eq!(evaluate(23.0, band, false), (false, false));
        assert_eq!(evaluate(37.0, band, false), (false, false));
        assert_eq!(evaluate(37.0, band, true), (false, true));
        assert_eq!(evaluate(37.1, band, true), (false, false));
    }

    #[test]
    fn zero_width_band_never_fires() {
        let band = ClickBand { low: 30, high: 30 };
        assert_eq!(evaluate(30.0, band, false), (false, false));
    }
}
