pub mod attendance_record;
pub mod calendar_event;
pub mod email_log;
pub mod enrollment;
pub mod session;
pub mod session_sweep;
pub mod student;
pub mod subject;
pub mod subject_schedule;
pub mod system_settings;
pub mod user;

pub use attendance_record::Entity as AttendanceRecord;
pub use calendar_event::Entity as CalendarEvent;
pub use email_log::Entity as EmailLog;
pub use enrollment::Entity as Enrollment;
pub use session::Entity as Session;
pub use session_sweep::Entity as SessionSweep;
pub use student::Entity as Student;
pub use subject::Entity as Subject;
pub use subject_schedule::Entity as SubjectSchedule;
pub use system_settings::Entity as SystemSettings;
pub use user::Entity as User;
