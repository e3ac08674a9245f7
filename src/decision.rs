use serde::Serialize;

pub const THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FrostLabel {
    Frost,
    NoFrost,
}

impl FrostLabel {
    /// Text used on screen and in the exported label column.
    pub fn text(self) -> &'static str {
        match self {
            FrostLabel::Frost => "有霜",
            FrostLabel::NoFrost => "无霜",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Advisory {
    Caution,
    Safe,
}

impl Advisory {
    pub fn message(self) -> &'static str {
        match self {
            Advisory::Caution => "⚠️ 注意：概率超过 50%，建议防霜。",
            Advisory::Safe => "✅ 安全：概率低于 50%，气象条件良好。",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decision {
    pub label: FrostLabel,
    pub display_color: &'static str,
    pub display_icon: &'static str,
    pub advisory: Advisory,
}

pub fn label_for(probability: f64) -> FrostLabel {
    // 0.5 itself is frost
    if probability >= THRESHOLD {
        FrostLabel::Frost
    } else {
        FrostLabel::NoFrost
    }
}

pub fn decide(probability: f64) -> Decision {
    match label_for(probability) {
        FrostLabel::Frost => Decision {
            label: FrostLabel::Frost,
            display_color: "red",
            display_icon: "❄️",
            advisory: Advisory::Caution,
        },
        FrostLabel::NoFrost => Decision {
            label: FrostLabel::NoFrost,
            display_color: "green",
            display_icon: "☀️",
            advisory: Advisory::Safe,
        },
    }
}
