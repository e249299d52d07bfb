use serde::{Deserialize, Serialize};

use crate::{SettingsError, Side, Spin, Vector2};

/// The serve variants. They differ in toss height, hit window and spin.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum ServeCategory {
    Standard,
    HighToss,
    LowToss,
}

impl ServeCategory {
    pub const ALL: [ServeCategory; 3] = [
        ServeCategory::Standard,
        ServeCategory::HighToss,
        ServeCategory::LowToss,
    ];

    /// Category number, 1 to 3.
    pub fn number(self) -> u8 {
        match self {
            ServeCategory::Standard => 1,
            ServeCategory::HighToss => 2,
            ServeCategory::LowToss => 3,
        }
    }

    pub fn from_number(n: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.number() == n)
    }

    fn index(self) -> usize {
        self.number() as usize - 1
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SwingKind {
    Forehand,
    Backhand,
    Serve(ServeCategory),
}

impl SwingKind {
    pub fn is_serve(self) -> bool {
        matches!(self, SwingKind::Serve(_))
    }
}

/// Frame timing and contact geometry of one swing animation.
///
/// Frames count from 1 (the first frame of the swing); 0 means idle.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SwingProfile {
    /// Frame at which the ball is tossed, if the swing tosses at all
    pub toss_frame: Option<u32>,
    /// First frame at which the player is planted
    pub backswing_frame: u32,
    /// First frame of the hit window, the frame the ball is struck on
    pub hit_start: u32,
    /// Last frame of the hit window (inclusive), the player stays planted until here
    pub hit_end: u32,
    /// Total number of frames
    pub length: u32,
    /// Racket contact point relative to the player, `x` lateral and `y` forward (towards
    /// the net), in meters
    pub contact_offset: Vector2,
    /// Upward speed of the toss in m/s
    pub toss_speed: f64,
}

impl SwingProfile {
    fn stroke(contact_offset: Vector2) -> Self {
        Self {
            toss_frame: None,
            backswing_frame: 4,
            hit_start: 9,
            hit_end: 12,
            length: 24,
            contact_offset,
            toss_speed: 0.0,
        }
    }

    fn serve(hit_start: u32, length: u32, toss_speed: f64) -> Self {
        Self {
            toss_frame: Some(2),
            backswing_frame: 1,
            hit_start,
            hit_end: hit_start + 2,
            length,
            contact_offset: Vector2::new(0.2, 0.3),
            toss_speed,
        }
    }

    /// Contact offset in world coordinates (`x`, `z`) for a player on `side`.
    pub fn world_offset(&self, side: Side) -> Vector2 {
        let sign = side.sign();
        Vector2::new(self.contact_offset.x * sign, -self.contact_offset.y * sign)
    }

    /// Whether the player may not move at the given swing frame.
    pub fn is_planted(&self, progress: u32) -> bool {
        progress >= self.backswing_frame && progress <= self.hit_end
    }

    pub fn validate(&self, name: &str) -> Result<(), SettingsError> {
        let invalid = |reason: &str| SettingsError::InvalidSwingProfile {
            name: name.to_string(),
            reason: reason.to_string(),
        };
        if self.hit_start < 2 {
            return Err(invalid("hit window must start at frame 2 or later"));
        }
        if self.hit_start > self.hit_end {
            return Err(invalid("hit window ends before it starts"));
        }
        if self.hit_end > self.length {
            return Err(invalid("hit window extends past the end of the swing"));
        }
        if matches!(self.toss_frame, Some(toss) if toss == 0 || toss >= self.hit_start) {
            return Err(invalid("toss must happen before the hit window"));
        }
        Ok(())
    }
}

/// All swing profiles of a player.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SwingTable {
    pub forehand: SwingProfile,
    pub backhand: SwingProfile,
    /// Serve profiles, by category
    pub serves: [SwingProfile; 3],
}

impl Default for SwingTable {
    fn default() -> Self {
        Self {
            forehand: SwingProfile::stroke(Vector2::new(0.35, 0.25)),
            backhand: SwingProfile::stroke(Vector2::new(-0.30, 0.22)),
            serves: [
                SwingProfile::serve(26, 40, 2.4),
                SwingProfile::serve(32, 46, 3.0),
                SwingProfile::serve(20, 34, 1.8),
            ],
        }
    }
}

impl SwingTable {
    pub fn get(&self, kind: SwingKind) -> &SwingProfile {
        match kind {
            SwingKind::Forehand => &self.forehand,
            SwingKind::Backhand => &self.backhand,
            SwingKind::Serve(category) => &self.serves[category.index()],
        }
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        self.forehand.validate("forehand")?;
        self.backhand.validate("backhand")?;
        for category in ServeCategory::ALL {
            self.get(SwingKind::Serve(category))
                .validate(&format!("serve {}", category.number()))?;
        }
        Ok(())
    }
}

/// Spin applied for each category, used for serves and rally strokes alike.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SpinPresets {
    pub categories: [Spin; 3],
}

impl Default for SpinPresets {
    fn default() -> Self {
        Self {
            categories: [Spin::new(0.0, -5.0), Spin::new(5.0, 0.0), Spin::new(0.0, 5.0)],
        }
    }
}

impl SpinPresets {
    pub fn get(&self, category: ServeCategory) -> Spin {
        self.categories[category.index()]
    }
}
