pub mod nominatim;
pub mod payments;

pub use nominatim::GeocodeClient;
pub use payments::PaymentAggregateClient;
