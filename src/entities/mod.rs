// Entity Models
//
// A Pet embeds its Animal attributes and adds the nickname key.
// No behaviour is shared through the embedding; it is plain composition.

pub mod pet;

pub use pet::{Animal, Pet, FIELD_NAMES};
