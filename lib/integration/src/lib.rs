//! External collaborators of the fishbot webhook.
//!
//! This crate provides:
//!
//! - **Classifier**: intent classification (Dialogflow `/query`)
//! - **Geocoder**: reverse geocoding of shared locations (Google Maps)
//! - **Species**: the fish catalog and image identification
//! - **Messenger**: message delivery, sender profiles and page setup
//! - **Image cache**: shared, bounded cache of fetched image bytes

pub mod classifier;
pub mod error;
pub mod geocode;
pub mod image_cache;
pub mod messenger;
pub mod species;

pub use classifier::{
    Classification, Classifier, ClassifierConfig, ClassifierQuery, Coordinates,
    DialogflowClassifier,
};
pub use error::{ClassifierError, DeliveryError, GeocodeError};
pub use geocode::{Geocoder, GeocoderConfig, GoogleGeocoder};
pub use image_cache::ImageCache;
pub use messenger::{
    DeliveryOutcome, MessageDelivery, MessengerClient, MessengerConfig, ProfileLookup,
};
pub use species::{RotatingRecognizer, SpeciesLookup, SpeciesRecognizer, SpeciesRecord, StaticCatalog};
