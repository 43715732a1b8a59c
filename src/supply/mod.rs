mod load;
mod model;

pub use load::load_dataset;
pub use model::{
    Dataset, Facility, FacilityDetails, FacilityType, MovementStatus, VehicleMovement,
};
