//! Per-frame gesture state machine.
//!
//! Owns everything that must survive between frames and decides which mouse
//! action, if any, a frame produces. Held gestures are edge-triggered: the
//! thumb toggles the left-button hold only on the frame it first appears,
//! and click gestures go through the distance debouncer.

use log::{debug, warn};

use crate::config::EngineConfig;
use crate::debounce;
use crate::gestures::{Gesture, classify};
use crate::smoothing::{self, ActiveRect, Point};
use crate::tracker::{HandFrame, landmarks};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Left,
    Right,
}

impl Button {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MouseAction {
    Move { x: f64, y: f64 },
    Click(Button),
    SetButtonDown { button: Button, down: bool },
}

// Both click gestures measure index↔middle, including the three-finger
// right click.
const LEFT_CLICK_PAIR: (usize, usize) =
    (landmarks::INDEX_FINGER_TIP, landmarks::MIDDLE_FINGER_TIP);
const RIGHT_CLICK_PAIR: (usize, usize) =
    (landmarks::INDEX_FINGER_TIP, landmarks::MIDDLE_FINGER_TIP);

#[derive(Debug, Clone, PartialEq)]
pub struct EngineState {
    pub previous_gesture: Gesture,
    /// Set while a click-band closure is in progress.
    pub clicked: bool,
    pub left_click_hold: bool,
    /// Last smoothed cursor position, before mirroring.
    pub smoothed_cursor: Point,
}

impl Default for EngineState {
    fn default() -> Self {
        Self {
            previous_gesture: Gesture::Fist,
            clicked: false,
            left_click_hold: false,
            smoothed_cursor: Point::default(),
        }
    }
}

#[derive(Debug)]
pub struct GestureEngine {
    cfg: EngineConfig,
    rect: ActiveRect,
    state: EngineState,
    // last classified gesture, including ones that never become `previous_gesture`
    last_gesture: Gesture,
}

impl GestureEngine {
    pub fn new(cfg: EngineConfig) -> Self {
        let rect = cfg.active_rect();
        Self {
            cfg,
            rect,
            state: EngineState::default(),
            last_gesture: Gesture::Fist,
        }
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    /// Gesture of the most recent frame that had a hand.
    pub fn last_gesture(&self) -> Gesture {
        self.last_gesture
    }

    pub fn step(&mut self, frame: &HandFrame) -> Option<MouseAction> {
        if !frame.has_hand() {
            return None;
        }

        let gesture = classify(frame.fingers);
        if gesture != self.last_gesture {
            debug!(
                "gesture {} -> {}",
                self.last_gesture.as_str(),
                gesture.as_str()
            );
            self.last_gesture = gesture;
        }

        match gesture {
            Gesture::Fist => {
                self.state.previous_gesture = Gesture::Fist;
                None
            }
            Gesture::Thumb => {
                let action = if self.state.previous_gesture != Gesture::Thumb {
                    self.state.left_click_hold = !self.state.left_click_hold;
                    Some(MouseAction::SetButtonDown {
                        button: Button::Left,
                        down: self.state.left_click_hold,
                    })
                } else {
                    None
                };
                self.state.previous_gesture = Gesture::Thumb;
                action
            }
            Gesture::Index => {
                let Some(tip) = frame.point(landmarks::INDEX_FINGER_TIP) else {
                    warn!("index gesture without index fingertip landmark; ignoring frame");
                    return None;
                };
                let smoothed = smoothing::smooth(
                    tip,
                    &self.rect,
                    self.cfg.screen,
                    self.state.smoothed_cursor,
                    self.cfg.smoothing_factor,
                );
                if !(smoothed.x.is_finite() && smoothed.y.is_finite()) {
                    warn!("index fingertip {tip:?} maps off any screen; ignoring frame");
                    return None;
                }
                self.state.smoothed_cursor = smoothed;
                self.state.previous_gesture = Gesture::Index;
                let target = smoothing::move_target(smoothed, self.cfg.screen);
                Some(MouseAction::Move {
                    x: target.x,
                    y: target.y,
                })
            }
            Gesture::IndexMiddle => self.click(frame, gesture, LEFT_CLICK_PAIR, Button::Left),
            Gesture::IndexMiddleRing => {
                self.click(frame, gesture, RIGHT_CLICK_PAIR, Button::Right)
            }
            Gesture::Middle | Gesture::Ring | Gesture::Pinky | Gesture::Unrecognized => None,
        }
    }

    fn click(
        &mut self,
        frame: &HandFrame,
        gesture: Gesture,
        (a, b): (usize, usize),
        button: Button,
    ) -> Option<MouseAction> {
        let Some(distance) = frame.distance(a, b) else {
            warn!(
                "{} gesture without landmarks {a}/{b}; ignoring frame",
                gesture.as_str()
            );
            return None;
        };
        let (fire, clicked) = debounce::evaluate(distance, self.cfg.click_band, self.state.clicked);
        self.state.clicked = clicked;
        self.state.previous_gesture = gesture;
        fire.then_some(MouseAction::Click(button))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gestures::FingerVector;
    use crate::smoothing::ScreenSize;
    use crate::tracker::Landmark;

    const FIST: [bool; 5] = [false, false, false, false, false];
    const THUMB: [bool; 5] = [true, false, false, false, false];
    const INDEX: [bool; 5] = [false, true, false, false, false];
    const INDEX_MIDDLE: [bool; 5] = [false, true, true, false, false];
    const INDEX_MIDDLE_RING: [bool; 5] = [false, true, true, true, false];
    const OPEN: [bool; 5] = [true, true, true, true, true];

    fn lm(id: usize, x: f64, y: f64) -> Landmark {
        Landmark { id, x, y }
    }

    fn frame(fingers: [bool; 5], landmarks: Vec<Landmark>) -> HandFrame {
        HandFrame {
            landmarks,
            fingers: FingerVector(fingers),
        }
    }

    // Index and middle tips `distance` pixels apart.
    fn pinch(fingers: [bool; 5], distance: f64) -> HandFrame {
        frame(
            fingers,
            vec![
                lm(4, 100.0, 100.0),
                lm(8, 200.0, 150.0),
                lm(12, 200.0 + distance, 150.0),
            ],
        )
    }

    fn hand(fingers: [bool; 5]) -> HandFrame {
        pinch(fingers, 60.0)
    }

    fn engine() -> GestureEngine {
        GestureEngine::new(EngineConfig::default())
    }

    #[test]
    fn starts_in_fist_with_flags_clear() {
        let e = engine();
        assert_eq!(e.state(), &EngineState::default());
        assert_eq!(e.state().previous_gesture, Gesture::Fist);
    }

    #[test]
    fn thumb_toggles_hold_once_per_appearance() {
        let mut e = engine();
        let seq = [FIST, THUMB, THUMB, THUMB, FIST, THUMB];
        let toggles: Vec<(usize, MouseAction)> = seq
            .iter()
            .enumerate()
            .filter_map(|(i, f)| e.step(&hand(*f)).map(|a| (i, a)))
            .collect();
        assert_eq!(
            toggles,
            vec![
                (
                    1,
                    MouseAction::SetButtonDown {
                        button: Button::Left,
                        down: true
                    }
                ),
                (
                    5,
                    MouseAction::SetButtonDown {
                        button: Button::Left,
                        down: false
                    }
                ),
            ]
        );
        assert!(!e.state().left_click_hold);
    }

    #[test]
    fn thumb_after_index_toggles_without_fist() {
        let mut e = engine();
        assert!(e.step(&hand(THUMB)).is_some());
        assert!(e.step(&hand(INDEX)).is_some());
        assert_eq!(
            e.step(&hand(THUMB)),
            Some(MouseAction::SetButtonDown {
                button: Button::Left,
                down: false
            })
        );
    }

    #[test]
    fn unrecognized_keeps_previous_gesture() {
        let mut e = engine();
        e.step(&hand(THUMB));
        assert_eq!(e.step(&hand(OPEN)), None);
        assert_eq!(e.state().previous_gesture, Gesture::Thumb);
        // still the same thumb posture, so no second toggle
        assert_eq!(e.step(&hand(THUMB)), None);
        assert!(e.state().left_click_hold);
    }

    #[test]
    fn single_finger_non_index_does_nothing() {
        let mut e = engine();
        e.step(&hand(INDEX));
        let before = e.state().clone();
        for f in [
            [false, false, true, false, false],
            [false, false, false, true, false],
            [false, false, false, false, true],
        ] {
            assert_eq!(e.step(&hand(f)), None);
        }
        assert_eq!(e.state(), &before);
    }

    #[test]
    fn left_click_debounced() {
        let mut e = engine();
        let clicks: Vec<usize> = [50.0, 30.0, 30.0, 30.0, 50.0, 30.0]
            .iter()
            .enumerate()
            .filter_map(|(i, d)| {
                e.step(&pinch(INDEX_MIDDLE, *d))
                    .map(|a| {
                        assert_eq!(a, MouseAction::Click(Button::Left));
                        i
                    })
            })
            .collect();
        assert_eq!(clicks, vec![1, 5]);
        assert_eq!(e.state().previous_gesture, Gesture::IndexMiddle);
    }

    #[test]
    fn dead_zone_does_not_rearm_click() {
        let mut e = engine();
        assert_eq!(
            e.step(&pinch(INDEX_MIDDLE, 30.0)),
            Some(MouseAction::Click(Button::Left))
        );
        assert_eq!(e.step(&pinch(INDEX_MIDDLE, 15.0)), None);
        assert_eq!(e.step(&pinch(INDEX_MIDDLE, 30.0)), None);
        assert!(e.state().clicked);
    }

    #[test]
    fn right_click_uses_index_middle_distance() {
        let mut e = engine();
        assert_eq!(
            e.step(&pinch(INDEX_MIDDLE_RING, 30.0)),
            Some(MouseAction::Click(Button::Right))
        );
        assert_eq!(e.state().previous_gesture, Gesture::IndexMiddleRing);
    }

    #[test]
    fn clicked_flag_is_shared_between_buttons() {
        let mut e = engine();
        assert!(e.step(&pinch(INDEX_MIDDLE, 30.0)).is_some());
        assert_eq!(e.step(&pinch(INDEX_MIDDLE_RING, 30.0)), None);
        e.step(&pinch(INDEX_MIDDLE_RING, 45.0));
        assert_eq!(
            e.step(&pinch(INDEX_MIDDLE, 30.0)),
            Some(MouseAction::Click(Button::Left))
        );
    }

    #[test]
    fn no_hand_leaves_state_untouched() {
        let mut e = engine();
        e.step(&hand(THUMB));
        let before = e.state().clone();
        assert_eq!(e.step(&HandFrame::default()), None);
        assert_eq!(e.state(), &before);
    }

    #[test]
    fn index_moves_mirrored_and_smoothed() {
        let cfg = EngineConfig::default();
        let screen = cfg.screen;
        let mut e = GestureEngine::new(cfg);
        // centre of the active rect maps to the screen centre
        let f = frame(INDEX, vec![lm(8, 320.0, 155.0)]);
        let Some(MouseAction::Move { x, y }) = e.step(&f) else {
            panic!("expected move");
        };
        let sx = f64::from(screen.width) / 2.0 / 7.0;
        let sy = f64::from(screen.height) / 2.0 / 7.0;
        assert!((x - (f64::from(screen.width) - sx)).abs() < 1e-9);
        assert!((y - sy).abs() < 1e-9);
        assert!((e.state().smoothed_cursor.x - sx).abs() < 1e-9);
        assert_eq!(e.state().previous_gesture, Gesture::Index);
    }

    #[test]
    fn index_move_is_clamped() {
        let cfg = EngineConfig {
            smoothing_factor: 1.0,
            screen: ScreenSize {
                width: 800,
                height: 600,
            },
            ..EngineConfig::default()
        };
        let mut e = GestureEngine::new(cfg);
        let f = frame(INDEX, vec![lm(8, 0.0, 479.0)]);
        assert_eq!(
            e.step(&f),
            Some(MouseAction::Move { x: 800.0, y: 600.0 })
        );
        // the unclamped value is what carries over
        assert!(e.state().smoothed_cursor.x < 0.0);
    }

    #[test]
    fn missing_landmark_skips_frame() {
        let mut e = engine();
        let f = frame(INDEX_MIDDLE, vec![lm(8, 1.0, 1.0)]);
        assert_eq!(e.step(&f), None);
        assert_eq!(e.state().previous_gesture, Gesture::Fist);
        let f = frame(INDEX, vec![lm(4, 1.0, 1.0)]);
        assert_eq!(e.step(&f), None);
        assert_eq!(e.state().smoothed_cursor, Point::default());
    }

    #[test]
    fn last_gesture_follows_every_classified_frame() {
        let mut e = engine();
        e.step(&hand(THUMB));
        e.step(&hand(OPEN));
        assert_eq!(e.last_gesture(), Gesture::Unrecognized);
        assert_eq!(e.state().previous_gesture, Gesture::Thumb);
        e.step(&HandFrame::default());
        assert_eq!(e.last_gesture(), Gesture::Unrecognized);
    }

    #[test]
    fn non_finite_target_skips_frame() {
        let mut e = engine();
        let good = frame(INDEX, vec![lm(8, 320.0, 155.0)]);
        assert!(e.step(&good).is_some());
        let before = e.state().clone();

        let huge = frame(INDEX, vec![lm(8, f64::MAX, 155.0)]);
        assert_eq!(e.step(&huge), None);
        assert_eq!(e.state(), &before);

        let Some(MouseAction::Move { x, y }) = e.step(&good) else {
            panic!("expected move");
        };
        assert!(x.is_finite() && y.is_finite());
        assert!(e.state().smoothed_cursor.x.is_finite());
    }
}
