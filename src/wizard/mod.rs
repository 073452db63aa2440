pub mod capture;
pub mod parsers;

pub use capture::{MedicineWizard, Slot, WizardOutcome, STEPS};
pub use parsers::{parse_days, parse_times};
