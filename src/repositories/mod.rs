pub mod devices;
pub mod energy;
pub mod insights;
pub mod predictions;
pub mod users;

pub use devices::DeviceRepository;
pub use energy::EnergyRepository;
pub use insights::InsightRepository;
pub use predictions::PredictionRepository;
pub use users::UserRepository;
