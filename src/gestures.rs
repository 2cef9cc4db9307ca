//! Finger-up vector classification.

use serde::{Deserialize, Deserializer};

/// Finger-up flags in anatomical order: thumb, index, middle, ring, pinky.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FingerVector(pub [bool; 5]);

// Trackers emit either `[0,1,0,0,0]` or `[false,true,...]`; take both.
impl<'de> Deserialize<'de> for FingerVector {
    fn deserialize<D>(de: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Flag {
            Bool(bool),
            Int(u8),
        }

        let raw = Vec::<Flag>::deserialize(de)?;
        if raw.len() != 5 {
            return Err(serde::de::Error::custom(format!(
                "fingers must have 5 entries, got {}",
                raw.len()
            )));
        }
        let mut flags = [false; 5];
        for (slot, f) in flags.iter_mut().zip(raw) {
            *slot = match f {
                Flag::Bool(b) => b,
                Flag::Int(0) => false,
                Flag::Int(1) => true,
                Flag::Int(n) => {
                    return Err(serde::de::Error::custom(format!(
                        "finger flag must be 0 or 1, got {n}"
                    )));
                }
            };
        }
        Ok(Self(flags))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gesture {
    Fist,
    Thumb,
    Index,
    Middle,
    Ring,
    Pinky,
    IndexMiddle,
    IndexMiddleRing,
    Unrecognized,
}

impl Gesture {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fist => "fist",
            Self::Thumb => "thumb",
            Self::Index => "index",
            Self::Middle => "middle",
            Self::Ring => "ring",
            Self::Pinky => "pinky",
            Self::IndexMiddle => "index_middle",
            Self::IndexMiddleRing => "index_middle_ring",
            Self::Unrecognized => "unrecognized",
        }
    }
}

pub fn classify(fingers: FingerVector) -> Gesture {
    match fingers.0 {
        [false, false, false, false, false] => Gesture::Fist,
        [true, false, false, false, false] => Gesture::Thumb,
        [false, true, false, false, false] => Gesture::Index,
        [false, false, true, false, false] => Gesture::Middle,
        [false, false, false, true, false] => Gesture::Ring,
        [false, false, false, false, true] => Gesture::Pinky,
        [false, true, true, false, false] => Gesture::IndexMiddle,
        [false, true, true, true, false] => Gesture::IndexMiddleRing,
        _ => Gesture::Unrecognized,
    }
}
