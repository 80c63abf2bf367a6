//! Easing curves from easings.net, evaluated in `f64`.

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AnimationError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EaseType {
    #[default]
    Linear,
    Sine,
    Cubic,
    Elastic,
    Bounce,
    Quint,
    Back,
}

impl EaseType {
    pub const ALL: [EaseType; 7] = [
        EaseType::Linear,
        EaseType::Sine,
        EaseType::Cubic,
        EaseType::Elastic,
        EaseType::Bounce,
        EaseType::Quint,
        EaseType::Back,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EaseType::Linear => "linear",
            EaseType::Sine => "sine",
            EaseType::Cubic => "cubic",
            EaseType::Elastic => "elastic",
            EaseType::Bounce => "bounce",
            EaseType::Quint => "quint",
            EaseType::Back => "back",
        }
    }
}

impl FromStr for EaseType {
    type Err = AnimationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EaseType::ALL
            .into_iter()
            .find(|e| e.as_str() == s)
            .ok_or_else(|| AnimationError::UnknownEase(s.to_string()))
    }
}

impl fmt::Display for EaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EaseVariant {
    #[default]
    In,
    Out,
    InOut,
}

impl EaseVariant {
    pub const ALL: [EaseVariant; 3] = [EaseVariant::In, EaseVariant::Out, EaseVariant::InOut];

    pub fn as_str(self) -> &'static str {
        match self {
            EaseVariant::In => "in",
            EaseVariant::Out => "out",
            EaseVariant::InOut => "inout",
        }
    }
}

impl FromStr for EaseVariant {
    type Err = AnimationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EaseVariant::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| AnimationError::UnknownVariant(s.to_string()))
    }
}

impl fmt::Display for EaseVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const C1: f64 = 1.70158;
const C2: f64 = C1 * 1.525;
const C3: f64 = C1 + 1.0;
const C4: f64 = (2.0 * PI) / 3.0;
const C5: f64 = (2.0 * PI) / 4.5;
const N1: f64 = 7.5625;
const D1: f64 = 2.75;

/// Maps linear progress `t` in `[0, 1]` onto the eased curve.
pub fn ease(kind: EaseType, variant: EaseVariant, t: f64) -> f64 {
    use EaseVariant::*;
    match kind {
        EaseType::Linear => t,
        EaseType::Sine => match variant {
            In => 1.0 - (t * PI / 2.0).cos(),
            Out => (t * PI / 2.0).sin(),
            InOut => -((PI * t).cos() - 1.0) / 2.0,
        },
        EaseType::Cubic => match variant {
            In => t * t * t,
            Out => 1.0 - (1.0 - t).powi(3),
            InOut if t < 0.5 => 4.0 * t * t * t,
            InOut => 1.0 - (-2.0 * t + 2.0).powi(3) / 2.0,
        },
        EaseType::Quint => match variant {
            In => t.powi(5),
            Out => 1.0 - (1.0 - t).powi(5),
            InOut if t < 0.5 => 16.0 * t.powi(5),
            InOut => 1.0 - (-2.0 * t + 2.0).powi(5) / 2.0,
        },
        EaseType::Elastic => elastic(variant, t),
        EaseType::Bounce => match variant {
            In => 1.0 - bounce_out(1.0 - t),
            Out => bounce_out(t),
            InOut if t < 0.5 => (1.0 - bounce_out(1.0 - 2.0 * t)) / 2.0,
            InOut => (1.0 + bounce_out(2.0 * t - 1.0)) / 2.0,
        },
        EaseType::Back => match variant {
            In => C3 * t * t * t - C1 * t * t,
            Out => 1.0 + C3 * (t - 1.0).powi(3) + C1 * (t - 1.0).powi(2),
            InOut if t < 0.5 => ((2.0 * t).powi(2) * ((C2 + 1.0) * 2.0 * t - C2)) / 2.0,
            InOut => ((2.0 * t - 2.0).powi(2) * ((C2 + 1.0) * (t * 2.0 - 2.0) + C2) + 2.0) / 2.0,
        },
    }
}

fn elastic(variant: EaseVariant, t: f64) -> f64 {
    if t == 0.0 || t == 1.0 {
        return t;
    }
    match variant {
        EaseVariant::In => -(2f64.powf(10.0 * t - 10.0)) * ((t * 10.0 - 10.75) * C4).sin(),
        EaseVariant::Out => 2f64.powf(-10.0 * t) * ((t * 10.0 - 0.75) * C4).sin() + 1.0,
        EaseVariant::InOut if t < 0.5 => -(2f64.powf(20.0 * t - 10.0) * ((20.0 * t - 11.125) * C5).sin()) / 2.0,
        EaseVariant::InOut => (2f64.powf(-20.0 * t + 10.0) * ((20.0 * t - 11.125) * C5).sin()) / 2.0 + 1.0,
    }
}

fn bounce_out(t: f64) -> f64 {
    if t < 1.0 / D1 {
        N1 * t * t
    } else if t < 2.0 / D1 {
        let t = t - 1.5 / D1;
        N1 * t * t + 0.75
    } else if t < 2.5 / D1 {
        let t = t - 2.25 / D1;
        N1 * t * t + 0.9375
    } else {
        let t = t - 2.625 / D1;
        N1 * t * t + 0.984375
    }
}
