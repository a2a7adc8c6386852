//! Synthetic log generator
//!
//! Fabricates log lines for a handful of fictitious services. Each service
//! has four everyday templates and four "bug" templates; a configurable
//! percentage of lines is drawn from the bug set.
//!
//! Generated records are plain payloads. When they are persisted they go
//! through the same ingestion path as any other client.

use crate::record::{LogLevel, NewRecord};
use chrono::{SecondsFormat, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

/// Services the generator knows about
pub const SERVICES: [&str; 5] = [
    "inventory-service",
    "pricing-engine",
    "payment-gateway",
    "inspection-api",
    "user-service",
];

/// Source tag on generated records
pub const GENERATOR_SOURCE: &str = "generator";

/// Default percentage of bug lines
pub const DEFAULT_BUG_FREQUENCY: u32 = 15;

/// Bounds on a single generation request
pub const MIN_COUNT: usize = 1;
pub const MAX_COUNT: usize = 1000;
pub const DEFAULT_COUNT: usize = 50;

const BRANDS: &[&str] = &[
    "Toyota", "Honda", "Nissan", "Chevrolet", "Ford", "Volkswagen", "BMW", "Audi", "Mazda", "Kia",
];
const MODELS: &[&str] = &[
    "Corolla", "Civic", "Sentra", "Onix", "Focus", "Jetta", "Series 3", "A4", "Mazda3", "Rio",
];

/// Messages that indicate an injected bug
static BUG_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)NullPointerException|SQL Injection|memory leak|Double charge|Sensitive data|Deadlock|IndexError|DivisionByZero|Negative price",
    )
    .expect("Invalid bug pattern regex")
});

/// Values a template can draw from
struct Context {
    vehicle: String,
    user: String,
    inspection: String,
    txn: String,
    brand: &'static str,
    model: &'static str,
    year: u32,
    price: u32,
    amount: u32,
    score: u32,
    pct: u32,
    ip: [u8; 3],
}

impl Context {
    fn random(rng: &mut impl Rng) -> Self {
        Self {
            vehicle: format!("VEH{:06}", 5000 + rng.gen_range(0..30)),
            user: format!("USR{:06}", 1000 + rng.gen_range(0..20)),
            inspection: format!("INS{:06}", 2000 + rng.gen_range(0..15)),
            txn: format!("TXN{}", rng.gen_range(100_000..=999_999)),
            brand: BRANDS.choose(rng).copied().unwrap_or("Toyota"),
            model: MODELS.choose(rng).copied().unwrap_or("Corolla"),
            year: rng.gen_range(2015..=2023),
            price: rng.gen_range(150_000..=450_000),
            amount: rng.gen_range(10_000..=500_000),
            score: rng.gen_range(65..=98),
            pct: rng.gen_range(15..=35),
            ip: [rng.gen_range(1..=255), rng.gen_range(1..=255), rng.gen_range(1..=255)],
        }
    }
}

type Template = (LogLevel, fn(&Context) -> String);

struct ServiceTemplates {
    normal: [Template; 4],
    bugs: [Template; 4],
}

const INVENTORY: ServiceTemplates = ServiceTemplates {
    normal: [
        (LogLevel::Info, |c| format!("Vehicle {} listed: {} {} {}, price ${}", c.vehicle, c.brand, c.model, c.year, c.price)),
        (LogLevel::Info, |c| format!("Loading vehicle details for {}", c.vehicle)),
        (LogLevel::Warning, |c| format!("Vehicle {} mileage data quality score is low: 0.{}", c.vehicle, c.score % 30 + 40)),
        (LogLevel::Error, |c| format!("Could not update vehicle {}: database connection timed out", c.vehicle)),
    ],
    bugs: [
        (LogLevel::Error, |c| format!("NullPointerException in getVehiclePrice() for {}: price is null", c.vehicle)),
        (LogLevel::Error, |c| format!("IndexError: image[5] requested but {} has only 3 images", c.vehicle)),
        (LogLevel::Warning, |c| format!("Memory leak suspected: vehicle cache above 10GB, {} never evicted", c.vehicle)),
        (LogLevel::Error, |c| format!("SQL Injection attempt blocked in search query \"' OR 1=1--\" for brand={}", c.brand)),
    ],
};

const PRICING: ServiceTemplates = ServiceTemplates {
    normal: [
        (LogLevel::Info, |c| format!("Pricing {}: base=${}, market_adjustment={}%", c.vehicle, c.price, c.pct % 15)),
        (LogLevel::Debug, |c| format!("Price model prediction for {}: confidence=0.{}", c.vehicle, c.score)),
        (LogLevel::Warning, |c| format!("Price volatility on {}: moved {}% in 24h", c.vehicle, c.pct)),
        (LogLevel::Error, |c| format!("Market data fetch for {} failed: upstream timeout after {}s", c.brand, c.pct + 15)),
    ],
    bugs: [
        (LogLevel::Error, |c| format!("DivisionByZeroError in depreciation(): vehicle age is 0 for {}", c.vehicle)),
        (LogLevel::Error, |c| format!("Negative price computed for {}: final=-${} (base ${})", c.vehicle, c.amount % 10_000 + 5_000, c.price)),
        (LogLevel::Error, |c| format!("TypeError: cannot multiply None by float in apply_discount() for {}", c.vehicle)),
        (LogLevel::Warning, |c| format!("Optimizer stuck: price {} returned over 1000 times in a row", c.price)),
    ],
};

const PAYMENT: ServiceTemplates = ServiceTemplates {
    normal: [
        (LogLevel::Info, |c| format!("Payment {} started for {}, amount=${}", c.txn, c.user, c.amount)),
        (LogLevel::Info, |c| format!("Payment {} settled by card processor", c.txn)),
        (LogLevel::Warning, |c| format!("Payment {} held for manual review: risk score high", c.txn)),
        (LogLevel::Error, |c| format!("Payment {} declined for {}: insufficient funds", c.txn, c.user)),
    ],
    bugs: [
        (LogLevel::Error, |c| format!("Double charge on {} for {}, amount=${}", c.txn, c.user, c.amount)),
        (LogLevel::Error, |c| format!("JSONDecodeError: malformed provider webhook for {}", c.txn)),
        (LogLevel::Error, |c| format!("Race condition: concurrent updates left {} inconsistent", c.txn)),
        (LogLevel::Error, |c| format!("Sensitive data written to logs in plaintext for {}", c.txn)),
    ],
};

const INSPECTION: ServiceTemplates = ServiceTemplates {
    normal: [
        (LogLevel::Info, |c| format!("Inspection {} started for {}", c.inspection, c.vehicle)),
        (LogLevel::Info, |c| format!("Inspection {} finished: score={}/100, status=APPROVED", c.inspection, c.score)),
        (LogLevel::Warning, |c| format!("Inspection {}: minor findings, tire_wear=moderate", c.inspection)),
        (LogLevel::Error, |c| format!("Inspection {} image upload failed: bucket access denied", c.inspection)),
    ],
    bugs: [
        (LogLevel::Error, |c| format!("IndexError: checklist item[25] missing for {}", c.inspection)),
        (LogLevel::Error, |c| format!("Score error: {} total={} exceeds 100", c.inspection, c.score + 15)),
        (LogLevel::Warning, |c| format!("Memory leak: images for {} never released, 500MB held", c.inspection)),
        (LogLevel::Error, |c| format!("Deadlock: {} waiting on lock for {} (timeout 300s)", c.inspection, c.vehicle)),
    ],
};

const USERS: ServiceTemplates = ServiceTemplates {
    normal: [
        (LogLevel::Info, |c| format!("User {} signed in from 10.{}.{}.{}", c.user, c.ip[0], c.ip[1], c.ip[2])),
        (LogLevel::Info, |c| format!("Profile updated for {}", c.user)),
        (LogLevel::Warning, |c| format!("Suspicious activity: {} tried 5 logins in 2 minutes", c.user)),
        (LogLevel::Error, |c| format!("Authentication failed for {}: token rejected", c.user)),
    ],
    bugs: [
        (LogLevel::Error, |c| format!("Duplicate key violation creating {}", c.user)),
        (LogLevel::Error, |c| format!("AttributeError: None has no attribute 'email' for {}", c.user)),
        (LogLevel::Warning, |c| format!("Session leak: {} holds 47 active sessions (limit 5)", c.user)),
        (LogLevel::Error, |c| format!("Authorization bypass: {} reached admin panel without permission", c.user)),
    ],
};

fn templates_for(service: &str) -> &'static ServiceTemplates {
    if service.contains("inventory") {
        &INVENTORY
    } else if service.contains("pricing") {
        &PRICING
    } else if service.contains("payment") {
        &PAYMENT
    } else if service.contains("inspection") {
        &INSPECTION
    } else {
        &USERS
    }
}

/// Generation knobs
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// `all` or a service name (matched by substring)
    pub service_type: String,
    /// `all` or a level name
    pub log_level: String,
    /// Percentage (0-100) of lines drawn from bug templates
    pub bug_frequency: u32,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            service_type: "all".to_string(),
            log_level: "all".to_string(),
            bug_frequency: DEFAULT_BUG_FREQUENCY,
        }
    }
}

/// One fabricated log line
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedLog {
    pub timestamp: String,
    pub level: LogLevel,
    pub service: String,
    pub message: String,
    pub raw: String,
}

impl GeneratedLog {
    /// Whether the message matches a known bug pattern
    pub fn is_bug(&self) -> bool {
        BUG_PATTERN.is_match(&self.message)
    }

    /// Convert into an insertable record
    pub fn to_record(&self) -> NewRecord {
        let mut record = NewRecord::new(self.raw.clone(), self.timestamp.clone());
        record.level = self.level.as_str().to_string();
        record.service = Some(self.service.clone());
        record.message = Some(self.message.clone());
        record.source = GENERATOR_SOURCE.to_string();
        record
    }
}

/// Counters over a generated batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GenerationStats {
    pub total: usize,
    pub errors: usize,
    pub warnings: usize,
    pub bugs: usize,
}

impl GenerationStats {
    pub fn from_logs(logs: &[GeneratedLog]) -> Self {
        let mut stats = Self::default();
        for log in logs {
            stats.total += 1;
            match log.level {
                LogLevel::Error => stats.errors += 1,
                LogLevel::Warning => stats.warnings += 1,
                _ => {}
            }
            if log.is_bug() {
                stats.bugs += 1;
            }
        }
        stats
    }
}

/// Random log line generator
pub struct LogGenerator {
    rng: StdRng,
}

impl LogGenerator {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic generator for tests and benchmarks
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Generate one line
    pub fn generate_one(&mut self, opts: &GenerateOptions) -> GeneratedLog {
        let has_bug = self.rng.gen_range(0..100) < opts.bug_frequency.min(100);

        let service = if opts.service_type.eq_ignore_ascii_case("all") || opts.service_type.is_empty() {
            SERVICES.choose(&mut self.rng).copied().unwrap_or(SERVICES[0]).to_string()
        } else {
            opts.service_type.clone()
        };

        let set = templates_for(&service);
        let ctx = Context::random(&mut self.rng);

        let (level, render) = if has_bug {
            *set.bugs.choose(&mut self.rng).unwrap_or(&set.bugs[0])
        } else if opts.log_level.eq_ignore_ascii_case("all") || opts.log_level.is_empty() {
            *set.normal.choose(&mut self.rng).unwrap_or(&set.normal[0])
        } else {
            let wanted = opts.log_level.parse::<LogLevel>().ok();
            set.normal
                .iter()
                .find(|(lvl, _)| Some(*lvl) == wanted)
                .copied()
                .unwrap_or(set.normal[0])
        };

        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let message = render(&ctx);
        let raw = render_raw(&timestamp, level, &service, &message);

        GeneratedLog {
            timestamp,
            level,
            service,
            message,
            raw,
        }
    }

    /// Generate `count` lines (clamped to `MIN_COUNT..=MAX_COUNT`)
    pub fn generate(&mut self, count: usize, opts: &GenerateOptions) -> Vec<GeneratedLog> {
        let count = clamp_count(count);
        (0..count).map(|_| self.generate_one(opts)).collect()
    }
}

impl Default for LogGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Single-line rendering used as the dedup key
pub fn render_raw(timestamp: &str, level: LogLevel, service: &str, message: &str) -> String {
    format!("[{}] {:<7} [{}] {}", timestamp, level.as_str(), service, message)
}

pub fn clamp_count(count: usize) -> usize {
    count.clamp(MIN_COUNT, MAX_COUNT)
}
