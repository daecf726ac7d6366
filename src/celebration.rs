use rand::seq::SliceRandom;
use rand::Rng;

const PARTICLE_COUNT: usize = 150;
const SPREAD_DEGREES: f64 = 70.0;
const DURATION_SECS: f64 = 3.0;
const GRAVITY: f64 = 12.0;
const SYMBOLS: [char; 6] = ['*', '+', '·', 'o', '✦', '●'];

/// One confetti fleck.
#[derive(Debug, Clone)]
pub struct Particle {
    pub x: f64,
    pub y: f64,
    pub vel_x: f64,
    pub vel_y: f64,
    pub symbol: char,
    pub color_index: usize,
}

impl Particle {
    fn spawn<R: Rng>(origin_x: f64, origin_y: f64, rng: &mut R) -> Self {
        // Cone pointing up, spread degrees wide
        let half = SPREAD_DEGREES.to_radians() / 2.0;
        let angle = std::f64::consts::FRAC_PI_2 + rng.gen_range(-half..half);
        let speed = rng.gen_range(6.0..18.0);
        Self {
            x: origin_x,
            y: origin_y,
            vel_x: angle.cos() * speed,
            vel_y: -angle.sin() * speed,
            symbol: *SYMBOLS.choose(rng).unwrap_or(&'*'),
            color_index: rng.gen_range(0..7),
        }
    }

    fn step(&mut self, dt: f64) {
        self.x += self.vel_x * dt;
        self.y += self.vel_y * dt;
        self.vel_y += GRAVITY * dt;
    }
}

/// New-record confetti burst: fired once from a point at 60% of the screen
/// height, rains out under gravity, expires after a fixed duration.
#[derive(Debug, Default)]
pub struct Confetti {
    pub particles: Vec<Particle>,
    elapsed_secs: f64,
    width: f64,
    height: f64,
}

impl Confetti {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fire<R: Rng>(&mut self, width: u16, height: u16, rng: &mut R) {
        self.width = width as f64;
        self.height = height as f64;
        self.elapsed_secs = 0.0;
        let origin_x = self.width / 2.0;
        let origin_y = self.height * 0.6;
        self.particles = (0..PARTICLE_COUNT)
            .map(|_| Particle::spawn(origin_x, origin_y, rng))
            .collect();
    }

    pub fn is_active(&self) -> bool {
        !self.particles.is_empty()
    }

    pub fn on_tick(&mut self, dt_secs: f64) {
        if self.particles.is_empty() {
            return;
        }
        self.elapsed_secs += dt_secs;
        if self.elapsed_secs >= DURATION_SECS {
            self.particles.clear();
            return;
        }
        let (w, h) = (self.width, self.height);
        self.particles.retain_mut(|p| {
            p.step(dt_secs);
            p.y <= h && p.x >= 0.0 && p.x <= w
        });
    }
}
