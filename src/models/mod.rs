pub mod booking;
pub mod car;
pub mod profile;

pub use booking::{Booking, BookingStatus, DateRange, NewBooking, Party, StatusUpdate};
pub use car::{Car, CarFilter, NewCar, PriceQuote};
pub use profile::{Profile, ProfileUpdate};
