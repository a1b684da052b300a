pub mod types;
pub mod slot_utils;
pub mod availability;
pub mod fairness;
pub mod allocation;

pub use types::{AbsenceRequest, Activity, ActivityKind, AllocationResult, SlotAssignment, TeacherSchedule};
pub use slot_utils::{resolve_range, BreakWindow, Slot, SlotCatalog};
pub use availability::eligible_teachers_for_slot;
pub use fairness::select;
pub use allocation::{allocate, plan_absence};
