pub mod locks;
pub mod memory;
pub mod postgrest;
pub mod repository;
pub mod state;
pub mod supabase;

pub use locks::SlotLocks;
pub use memory::InMemoryStore;
pub use postgrest::SupabaseStore;
pub use repository::{
    AdjustmentRepository, AppointmentRepository, DirectoryRepository, HospitalStore,
    ScheduleRepository,
};
pub use state::AppState;
pub use supabase::SupabaseClient;
