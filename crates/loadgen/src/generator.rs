//! Synthetic product records.
//!
//! Generation is deterministic for a given seed so that repeated runs seed
//! the same dataset.

use prioload_types::{Record, RecordId};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const CATEGORIES: &[&str] = &[
    "Automotive", "Baby", "Beauty", "Books", "Clothing", "Computers", "Electronics", "Games",
    "Garden", "Grocery", "Health", "Home", "Industrial", "Jewelery", "Kids", "Movies", "Music",
    "Outdoors", "Shoes", "Sports", "Tools", "Toys",
];

const ADJECTIVES: &[&str] = &[
    "Small", "Ergonomic", "Rustic", "Intelligent", "Gorgeous", "Incredible", "Fantastic",
    "Practical", "Sleek", "Awesome", "Generic", "Handcrafted", "Handmade", "Licensed", "Refined",
    "Unbranded", "Tasty",
];

const MATERIALS: &[&str] = &[
    "Steel", "Wooden", "Concrete", "Plastic", "Cotton", "Granite", "Rubber", "Metal", "Soft",
    "Fresh", "Frozen",
];

const PRODUCTS: &[&str] = &[
    "Chair", "Car", "Computer", "Keyboard", "Mouse", "Bike", "Ball", "Gloves", "Pants", "Shirt",
    "Table", "Shoes", "Hat", "Towels", "Soap", "Tuna", "Chicken", "Fish", "Cheese", "Bacon",
    "Pizza", "Salad", "Sausages", "Chips",
];

/// Generates product records with dense, sequential ids.
#[derive(Debug, Clone)]
pub struct RecordGenerator {
    seed: u64,
}

impl RecordGenerator {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Generate `count` records with ids `id_<offset>..id_<offset + count - 1>`.
    pub fn generate(&self, count: u64, offset: u64) -> Vec<Record> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        (0..count)
            .map(|i| Self::generate_one(RecordId(offset + i), &mut rng))
            .collect()
    }

    fn generate_one<R: Rng + ?Sized>(id: RecordId, rng: &mut R) -> Record {
        let pick = |words: &[&'static str], rng: &mut R| -> &'static str {
            words.choose(rng).copied().unwrap_or_default()
        };

        let category = pick(CATEGORIES, rng).to_string();
        let name = format!(
            "{} {} {}",
            pick(ADJECTIVES, rng),
            pick(MATERIALS, rng),
            pick(PRODUCTS, rng)
        );

        Record {
            id,
            category,
            name,
            quantity: rng.gen_range(1..=100),
            price_cents: rng.gen_range(100..5_000_000),
            clearance_flag: rng.gen_bool(0.5),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_dense_from_offset() {
        let records = RecordGenerator::new(1).generate(5, 10);
        let ids: Vec<String> = records.iter().map(|r| r.id.to_string()).collect();
        assert_eq!(ids, vec!["id_10", "id_11", "id_12", "id_13", "id_14"]);
    }

    #[test]
    fn test_deterministic_for_seed() {
        let a = RecordGenerator::new(42).generate(20, 0);
        let b = RecordGenerator::new(42).generate(20, 0);
        let c = RecordGenerator::new(43).generate(20, 0);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_field_ranges() {
        for record in RecordGenerator::new(7).generate(500, 0) {
            assert!((1..=100).contains(&record.quantity));
            assert!((100..5_000_000).contains(&record.price_cents));
            assert!(CATEGORIES.contains(&record.category.as_str()));
            assert_eq!(record.name.split(' ').count(), 3);
            assert_eq!(record.partition_key(), record.id.to_string());
        }
    }
}
