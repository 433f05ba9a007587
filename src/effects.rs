//! Decorative particles: a slow ambient drift that runs for the whole process
//! and a confetti burst when a high score falls. Nothing here touches the
//! session.

use rand::seq::SliceRandom;
use rand::Rng;
use std::time::{Duration, Instant};

/// How often a new ambient burst is spawned.
pub const AMBIENT_INTERVAL: Duration = Duration::from_secs(2);
const AMBIENT_PER_BURST: usize = 3;
const CONFETTI_COUNT: usize = 50;
const FRAME_DT: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticleKind {
    Ambient,
    Confetti,
}

#[derive(Debug, Clone)]
pub struct Particle {
    pub x: f64,
    pub y: f64,
    pub vel_x: f64,
    pub vel_y: f64,
    pub symbol: char,
    pub color_index: usize,
    pub age: f64,
    pub max_age: f64,
    pub kind: ParticleKind,
}

impl Particle {
    fn ambient<R: Rng>(rng: &mut R, width: f64, height: f64) -> Self {
        Self {
            x: rng.gen_range(0.0..width.max(1.0)),
            y: height + 1.0,
            vel_x: rng.gen_range(-1.0..1.0),
            vel_y: rng.gen_range(-4.0..-2.0),
            symbol: *['·', '•', '∘'].choose(rng).unwrap_or(&'·'),
            color_index: rng.gen_range(0..3),
            age: 0.0,
            max_age: rng.gen_range(2.0..5.0),
            kind: ParticleKind::Ambient,
        }
    }

    fn confetti<R: Rng>(rng: &mut R, width: f64) -> Self {
        Self {
            x: rng.gen_range(0.0..width.max(1.0)),
            y: 0.0,
            vel_x: rng.gen_range(-3.0..3.0),
            vel_y: rng.gen_range(0.0..2.0),
            symbol: *['*', '+', '▪', '◆', '✦'].choose(rng).unwrap_or(&'*'),
            color_index: rng.gen_range(0..4),
            age: 0.0,
            max_age: rng.gen_range(1.0..3.0),
            kind: ParticleKind::Confetti,
        }
    }

    /// Advance by `dt` seconds. Returns false once the particle has expired.
    fn update(&mut self, dt: f64) -> bool {
        self.x += self.vel_x * dt;
        self.y += self.vel_y * dt;
        if self.kind == ParticleKind::Confetti {
            self.vel_y += 9.0 * dt;
        }
        self.age += dt;
        self.age < self.max_age
    }
}

#[derive(Debug)]
pub struct Effects {
    pub particles: Vec<Particle>,
    last_burst: Option<Instant>,
    width: f64,
    height: f64,
}

impl Effects {
    pub fn new() -> Self {
        Self {
            particles: Vec::new(),
            last_burst: None,
            width: 80.0,
            height: 24.0,
        }
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = f64::from(width);
        self.height = f64::from(height);
    }

    /// Spawn an ambient burst if [`AMBIENT_INTERVAL`] has passed since the last one.
    pub fn maybe_burst(&mut self, now: Instant) -> bool {
        let due = self
            .last_burst
            .map_or(true, |last| now.duration_since(last) >= AMBIENT_INTERVAL);
        if due {
            let mut rng = rand::thread_rng();
            for _ in 0..AMBIENT_PER_BURST {
                self.particles
                    .push(Particle::ambient(&mut rng, self.width, self.height));
            }
            self.last_burst = Some(now);
        }
        due
    }

    pub fn confetti(&mut self) {
        let mut rng = rand::thread_rng();
        for _ in 0..CONFETTI_COUNT {
            self.particles.push(Particle::confetti(&mut rng, self.width));
        }
    }

    pub fn has_confetti(&self) -> bool {
        self.particles
            .iter()
            .any(|p| p.kind == ParticleKind::Confetti)
    }

    /// Advance every particle one animation frame and drop the dead or off-screen ones.
    pub fn update(&mut self) {
        let (width, height) = (self.width, self.height);
        let buffer = 5.0;
        self.particles.retain_mut(|particle| {
            let alive = particle.update(FRAME_DT);
            let off_screen = particle.y < -buffer
                || particle.y > height + buffer
                || particle.x < -buffer
                || particle.x > width + buffer;
            alive && !off_screen
        });
    }
}

impl Default for Effects {
    fn default() -> Self {
        Self::new()
    }
}
