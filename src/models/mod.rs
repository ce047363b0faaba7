pub mod category;
pub mod task;
pub mod user;

pub use category::{Category, CategorySeed, CATALOG};
pub use task::{
    NewTask, Task, TaskDraft, TaskFilters, TaskPriority, TaskQuery, TaskRequest,
    TaskWithCategory,
};
pub use user::{
    ForgotPasswordRequest, LoginRequest, LoginResponse, MessageResponse, NewUser, PublicUser,
    RegisterRequest, ResetPasswordRequest, User, VerifyEmailQuery,
};
