//! Game state and core simulation types
//!
//! Every value the simulation mutates lives here or in the registry it owns.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::effects::Backdrop;
use super::registry::{Entity, EntityId, Registry};
use super::weapon::WeaponClock;
use crate::consts::*;
use crate::from_angle;

/// Current phase of the match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Title screen, nothing simulates
    Menu,
    /// Active gameplay
    Playing,
    /// Frozen by the player
    Paused,
    /// Player hp reached zero
    GameOver,
}

/// Player weapon families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WeaponType {
    /// Wide forward spread
    #[default]
    Vulcan,
    /// Piercing beams
    Laser,
    /// Homing orbs
    Plasma,
}

impl WeaponType {
    pub const ALL: [WeaponType; 3] = [WeaponType::Vulcan, WeaponType::Laser, WeaponType::Plasma];

    /// Out-of-range indices fall back to Vulcan
    pub fn from_index(index: u32) -> Self {
        Self::ALL.get(index as usize).copied().unwrap_or_default()
    }

    pub fn index(self) -> u32 {
        match self {
            WeaponType::Vulcan => 0,
            WeaponType::Laser => 1,
            WeaponType::Plasma => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WeaponType::Vulcan => "VULCAN",
            WeaponType::Laser => "LASER",
            WeaponType::Plasma => "PLASMA",
        }
    }

    /// Ship tint for this weapon
    pub fn player_color(self) -> u32 {
        match self {
            WeaponType::Vulcan => 0xef4444,
            WeaponType::Laser => 0x3b82f6,
            WeaponType::Plasma => 0xc084fc,
        }
    }

    /// The colored power-up that selects this weapon
    pub fn power_up(self) -> PowerUpKind {
        match self {
            WeaponType::Vulcan => PowerUpKind::PRed,
            WeaponType::Laser => PowerUpKind::PBlue,
            WeaponType::Plasma => PowerUpKind::PPurple,
        }
    }
}

/// Shared base shape of every entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Body {
    pub id: EntityId,
    pub pos: Vec2,
    pub vel: Vec2,
    /// Full width/height of the collision box
    pub size: Vec2,
    /// 0xRRGGBB
    pub color: u32,
    dead: bool,
}

impl Body {
    pub fn new(id: EntityId, pos: Vec2, vel: Vec2, size: Vec2, color: u32) -> Self {
        Self {
            id,
            pos,
            vel,
            size,
            color,
            dead: false,
        }
    }

    pub fn half_extents(&self) -> Vec2 {
        self.size * 0.5
    }

    pub fn integrate(&mut self) {
        self.pos += self.vel;
    }
}

macro_rules! impl_entity {
    ($($ty:ty),*) => {
        $(impl Entity for $ty {
            fn id(&self) -> EntityId {
                self.body.id
            }

            fn is_dead(&self) -> bool {
                self.body.dead
            }

            fn kill(&mut self) {
                self.body.dead = true;
            }
        })*
    };
}

impl_entity!(Bullet, Enemy, PowerUp, Particle);

/// The player's ship
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub body: Body,
    pub hp: f32,
    pub max_hp: f32,
    pub speed: f32,
    pub bombs: u32,
    pub weapon: WeaponType,
    pub weapon_level: u32,
    /// Frames of hit immunity left (spawn grace, post-hit grace, invincibility)
    pub invulnerable_timer: u32,
    /// Frame of the most recent damage
    pub last_hit_frame: u64,
    /// Frames of boosted fire rate and damage left
    pub hyper_mode_timer: u32,
    /// Spread phase, advanced by over-capped pickups
    pub weapon_variant: u32,
}

impl Player {
    pub fn new(weapon: WeaponType) -> Self {
        Self {
            body: Body::new(
                EntityId(0),
                Vec2::new(FIELD_WIDTH / 2.0, FIELD_HEIGHT - 100.0),
                Vec2::ZERO,
                Vec2::new(PLAYER_WIDTH, PLAYER_HEIGHT),
                weapon.player_color(),
            ),
            hp: PLAYER_MAX_HP,
            max_hp: PLAYER_MAX_HP,
            speed: PLAYER_SPEED,
            bombs: PLAYER_START_BOMBS,
            weapon,
            weapon_level: 1,
            invulnerable_timer: SPAWN_INVULNERABILITY_FRAMES,
            last_hit_frame: 0,
            hyper_mode_timer: 0,
            weapon_variant: 0,
        }
    }

    pub fn pos(&self) -> Vec2 {
        self.body.pos
    }

    pub fn is_invulnerable(&self) -> bool {
        self.invulnerable_timer > 0
    }

    pub fn hyper_active(&self) -> bool {
        self.hyper_mode_timer > 0
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0.0
    }

    /// Apply damage and arm the post-hit grace window
    pub fn take_hit(&mut self, amount: f32, frame: u64) {
        self.hp = (self.hp - amount).clamp(0.0, self.max_hp);
        self.invulnerable_timer = HIT_GRACE_FRAMES;
        self.last_hit_frame = frame;
    }

    pub fn heal(&mut self, amount: f32) {
        self.hp = (self.hp + amount).min(self.max_hp);
    }

    /// Raise weapon level, clamped. Returns false if already at max.
    pub fn raise_weapon_level(&mut self, steps: u32) -> bool {
        if self.weapon_level >= MAX_WEAPON_LEVEL {
            return false;
        }
        self.weapon_level = (self.weapon_level + steps).clamp(1, MAX_WEAPON_LEVEL);
        true
    }

    pub fn switch_weapon(&mut self, weapon: WeaponType) {
        self.weapon = weapon;
        self.weapon_variant = 0;
        self.body.color = weapon.player_color();
    }

    /// Keep the ship fully inside the play-field
    pub fn clamp_to_field(&mut self) {
        let half = self.body.half_extents();
        self.body.pos.x = self.body.pos.x.clamp(half.x, FIELD_WIDTH - half.x);
        self.body.pos.y = self.body.pos.y.clamp(half.y, FIELD_HEIGHT - half.y);
    }
}

/// Attack patterns, one per enemy type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttackPattern {
    /// Single shot at the player's bearing
    Straight,
    /// Fast shot at the player's bearing
    Aimed,
    /// Three-way downward fan
    Spread,
    /// Rotating radial rings
    Spiral,
}

/// Boss movement phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BossPhase {
    /// Descending into view
    Entering,
    /// Sinusoidal drift, forever
    Hovering,
}

/// Boss-only state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BossBrain {
    pub phase: BossPhase,
    /// Frames since the boss spawned
    pub age: u32,
    /// Frames until the next radial ring
    pub ring_cooldown: u32,
    /// Frames until the next aimed triple-shot
    pub volley_cooldown: u32,
}

/// Enemy types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnemyKind {
    Fighter,
    Interceptor,
    Bomber,
    Tank,
    Boss(BossBrain),
}

/// Per-type base stats for regular enemies
#[derive(Debug, Clone, Copy)]
pub struct EnemyStats {
    pub hp: f32,
    pub score: u64,
    pub size: f32,
    pub speed: f32,
    pub color: u32,
    pub pattern: AttackPattern,
    /// Frames between shots
    pub shot_cooldown: u32,
}

impl EnemyKind {
    /// Weighted spawn table over a uniform roll in [0, 1)
    pub fn roll(r: f32) -> Self {
        if r > 0.9 {
            EnemyKind::Bomber
        } else if r > 0.75 {
            EnemyKind::Tank
        } else if r > 0.55 {
            EnemyKind::Interceptor
        } else {
            EnemyKind::Fighter
        }
    }

    pub fn stats(&self) -> EnemyStats {
        match self {
            EnemyKind::Fighter => EnemyStats {
                hp: 25.0,
                score: 100,
                size: 36.0,
                speed: 3.0,
                color: 0xef4444,
                pattern: AttackPattern::Straight,
                shot_cooldown: 100,
            },
            EnemyKind::Interceptor => EnemyStats {
                hp: 40.0,
                score: 150,
                size: 32.0,
                speed: 4.5,
                color: 0xfacc15,
                pattern: AttackPattern::Aimed,
                shot_cooldown: 40,
            },
            EnemyKind::Bomber => EnemyStats {
                hp: 120.0,
                score: 400,
                size: 56.0,
                speed: 1.5,
                color: 0x94a3b8,
                pattern: AttackPattern::Spread,
                shot_cooldown: 90,
            },
            EnemyKind::Tank => EnemyStats {
                hp: 100.0,
                score: 300,
                size: 48.0,
                speed: 1.2,
                color: 0x22c55e,
                pattern: AttackPattern::Straight,
                shot_cooldown: 100,
            },
            EnemyKind::Boss(_) => EnemyStats {
                hp: 3000.0,
                score: 5000,
                size: 140.0,
                speed: 1.0,
                color: 0xa855f7,
                pattern: AttackPattern::Spiral,
                shot_cooldown: 40,
            },
        }
    }

    pub fn is_boss(&self) -> bool {
        matches!(self, EnemyKind::Boss(_))
    }
}

/// An enemy ship
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub body: Body,
    pub hp: f32,
    pub max_hp: f32,
    pub kind: EnemyKind,
    pub pattern: AttackPattern,
    pub score_value: u64,
    /// Frames since the last shot
    pub shoot_timer: u32,
    /// Per-instance phase for wave motion
    pub pattern_offset: f32,
}

/// Fraction of max hp below which a boss attacks harder
pub const FRENZY_THRESHOLD: f32 = 0.3;

impl Enemy {
    pub fn is_boss(&self) -> bool {
        self.kind.is_boss()
    }

    pub fn is_frenzied(&self) -> bool {
        self.is_boss() && self.hp < self.max_hp * FRENZY_THRESHOLD
    }
}

/// Who fired a bullet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Owner {
    Player,
    Enemy,
}

/// Bullet flight/hit behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BulletBehavior {
    #[default]
    Normal,
    /// Fast steering toward the nearest enemy
    Homing,
    /// Survives hits, damaging everything it overlaps each frame
    Beam,
    /// Slow drifting charge with lazy steering
    Mine,
}

impl BulletBehavior {
    /// Whether the bullet survives hitting an enemy
    pub fn pierces(self) -> bool {
        self == BulletBehavior::Beam
    }

    pub fn steers(self) -> bool {
        matches!(self, BulletBehavior::Homing | BulletBehavior::Mine)
    }
}

/// A projectile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bullet {
    pub body: Body,
    pub owner: Owner,
    pub damage: f32,
    /// Facing in radians
    pub angle: f32,
    pub behavior: BulletBehavior,
}

/// Enemy bullet box
pub const ENEMY_BULLET_SIZE: f32 = 10.0;
pub const ENEMY_BULLET_COLOR: u32 = 0xfca5a5;

impl Bullet {
    pub fn new(
        id: EntityId,
        owner: Owner,
        pos: Vec2,
        angle: f32,
        speed: f32,
        damage: f32,
        behavior: BulletBehavior,
    ) -> Self {
        Self {
            body: Body::new(
                id,
                pos,
                from_angle(angle, speed),
                Vec2::splat(ENEMY_BULLET_SIZE),
                ENEMY_BULLET_COLOR,
            ),
            owner,
            damage,
            angle,
            behavior,
        }
    }

    /// Override the collision box and tint
    pub fn with_look(mut self, size: Vec2, color: u32) -> Self {
        self.body.size = size;
        self.body.color = color;
        self
    }

    pub fn is_player_owned(&self) -> bool {
        self.owner == Owner::Player
    }
}

/// Power-up types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerUpKind {
    PRed,
    PBlue,
    PPurple,
    PUpgrade,
    Bomb,
    Health,
    ScoreGold,
    ScoreSilver,
    Invincibility,
}

impl PowerUpKind {
    /// Weapon selected by a colored pickup
    pub fn weapon(self) -> Option<WeaponType> {
        match self {
            PowerUpKind::PRed => Some(WeaponType::Vulcan),
            PowerUpKind::PBlue => Some(WeaponType::Laser),
            PowerUpKind::PPurple => Some(WeaponType::Plasma),
            _ => None,
        }
    }

    pub fn is_score(self) -> bool {
        matches!(self, PowerUpKind::ScoreGold | PowerUpKind::ScoreSilver)
    }

    pub fn color(self) -> u32 {
        match self {
            PowerUpKind::PRed => 0xef4444,
            PowerUpKind::PBlue => 0x3b82f6,
            PowerUpKind::PPurple => 0xa855f7,
            PowerUpKind::PUpgrade => 0xfacc15,
            PowerUpKind::Bomb => 0xf59e0b,
            PowerUpKind::Health => 0x22c55e,
            PowerUpKind::ScoreGold => 0xfbbf24,
            PowerUpKind::ScoreSilver => 0x94a3b8,
            PowerUpKind::Invincibility => 0x22d3ee,
        }
    }
}

pub const POWER_UP_SIZE: f32 = 24.0;

/// A falling pickup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerUp {
    pub body: Body,
    pub kind: PowerUpKind,
}

impl PowerUp {
    pub fn new(id: EntityId, kind: PowerUpKind, pos: Vec2, vel: Vec2) -> Self {
        Self {
            body: Body::new(id, pos, vel, Vec2::splat(POWER_UP_SIZE), kind.color()),
            kind,
        }
    }
}

/// Particle variants
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ParticleKind {
    /// Plain glowing dot
    Spark,
    /// Tumbling wreckage
    Debris { rotation: f32, spin: f32 },
    /// Expanding ring (critical hits, boss death)
    Shockwave,
    /// Full-field white flash (bombs)
    Flash,
}

/// A cosmetic particle (no gameplay effect)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    pub body: Body,
    pub life: f32,
    pub max_life: f32,
    pub scale: f32,
    pub kind: ParticleKind,
}

impl Particle {
    /// Opacity implied by remaining life
    pub fn alpha(&self) -> f32 {
        if self.max_life <= 0.0 {
            return 0.0;
        }
        (self.life / self.max_life).clamp(0.0, 1.0)
    }
}

/// Discrete audio cues emitted by the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SoundCue {
    Shoot,
    Laser,
    Explode,
    PowerUp,
    Bomb,
    Coin,
    Invincible,
}

/// HUD values published to the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HudSnapshot {
    pub score: u64,
    pub hp: f32,
    pub max_hp: f32,
    pub bombs: u32,
    pub weapon: WeaponType,
    pub weapon_level: u32,
    pub level: u32,
}

/// Things that happened during a tick, drained by the driver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    Sound(SoundCue),
    HudSync(HudSnapshot),
    BossSpawned { level: u32 },
    BossDefeated { level: u32 },
    LevelStarted { level: u32 },
    PlayerHit { hp: f32 },
    GameOver { score: u64 },
}

fn detached_rng() -> Pcg32 {
    Pcg32::seed_from_u64(0)
}

/// Salt separating the cosmetic RNG stream from the gameplay one
const FX_STREAM_SALT: u64 = 0x9e37_79b9_7f4a_7c15;

/// Complete match state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub phase: GamePhase,
    /// Logical frames simulated this match
    pub frame: u64,
    pub score: u64,
    pub level: u32,
    pub boss_active: bool,
    pub next_boss_threshold: u64,
    /// Frames left in the post-boss pause
    pub level_transition_timer: u32,
    pub camera_shake: f32,
    pub registry: Registry,
    pub backdrop: Backdrop,
    pub weapon_clock: WeaponClock,
    /// Frames until the next regular enemy spawn
    pub spawn_cooldown: u32,
    /// Frames until the next regen tick
    pub regen_cooldown: u32,
    /// Weapon the player starts each match with
    pub starting_weapon: WeaponType,
    /// Frames between HUD snapshots
    pub hud_sync_interval: u32,
    /// Cap on cosmetic spark particles
    pub max_particles: usize,
    /// Outbox, drained by the driver after each tick
    #[serde(skip)]
    pub events: Vec<GameEvent>,
    /// Gameplay RNG (spawns, drops, pickups)
    #[serde(skip, default = "detached_rng")]
    pub rng: Pcg32,
    /// Cosmetic RNG (particles, backdrop)
    #[serde(skip, default = "detached_rng")]
    pub fx_rng: Pcg32,
}

/// Default cosmetic particle budget
pub const MAX_PARTICLES: usize = 1500;

impl GameState {
    /// Create a state sitting on the menu
    pub fn new(seed: u64, starting_weapon: WeaponType) -> Self {
        let mut fx_rng = Pcg32::seed_from_u64(seed ^ FX_STREAM_SALT);
        let backdrop = Backdrop::new(&mut fx_rng);
        Self {
            seed,
            phase: GamePhase::Menu,
            frame: 0,
            score: 0,
            level: 1,
            boss_active: false,
            next_boss_threshold: BOSS_SCORE_THRESHOLD,
            level_transition_timer: 0,
            camera_shake: 0.0,
            registry: Registry::new(Player::new(starting_weapon)),
            backdrop,
            weapon_clock: WeaponClock::new(starting_weapon),
            spawn_cooldown: super::enemy::spawn_interval(1),
            regen_cooldown: REGEN_INTERVAL_FRAMES,
            starting_weapon,
            hud_sync_interval: HUD_SYNC_INTERVAL,
            max_particles: MAX_PARTICLES,
            events: Vec::new(),
            rng: Pcg32::seed_from_u64(seed),
            fx_rng,
        }
    }

    /// Create a state already in a fresh match
    pub fn new_match(seed: u64, starting_weapon: WeaponType) -> Self {
        let mut state = Self::new(seed, starting_weapon);
        state.start_match(seed);
        state
    }

    /// MENU/GAME_OVER -> PLAYING: reset every core value
    pub fn start_match(&mut self, seed: u64) {
        let hud_sync_interval = self.hud_sync_interval;
        let max_particles = self.max_particles;
        *self = Self::new(seed, self.starting_weapon);
        self.hud_sync_interval = hud_sync_interval.max(1);
        self.max_particles = max_particles;
        self.phase = GamePhase::Playing;
        log::info!(
            "Match started (seed {}, weapon {})",
            seed,
            self.starting_weapon.as_str()
        );
    }

    /// Leave the match and return to the title screen
    pub fn return_to_menu(&mut self) {
        self.phase = GamePhase::Menu;
    }

    pub fn player(&self) -> &Player {
        &self.registry.player
    }

    pub fn player_mut(&mut self) -> &mut Player {
        &mut self.registry.player
    }

    pub fn in_level_transition(&self) -> bool {
        self.level_transition_timer > 0
    }

    pub fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub fn play(&mut self, cue: SoundCue) {
        self.events.push(GameEvent::Sound(cue));
    }

    /// Take every event queued since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn hud_snapshot(&self) -> HudSnapshot {
        let player = self.player();
        HudSnapshot {
            score: self.score,
            hp: player.hp,
            max_hp: player.max_hp,
            bombs: player.bombs,
            weapon: player.weapon,
            weapon_level: player.weapon_level,
            level: self.level,
        }
    }

    /// Add camera shake, keeping the strongest request this frame
    pub fn shake(&mut self, magnitude: f32) {
        self.camera_shake = self.camera_shake.max(magnitude);
    }

    /// Remove every enemy-owned bullet at the next compaction
    pub fn clear_enemy_bullets(&mut self) -> usize {
        let mut cleared = 0;
        for bullet in self.registry.bullets.live_mut() {
            if bullet.owner == Owner::Enemy {
                bullet.kill();
                cleared += 1;
            }
        }
        cleared
    }
}
