mod metadata;
mod models;

pub use metadata::{Metadata, WEBHOOK_URL_KEY};
pub use models::{
    ApiToken, DEFAULT_MAX_CONCURRENT_MEETINGS, Meeting, MeetingCounts, MeetingStatus,
    MeetingStatusCounts, MeetingWithUser, NewMeeting, NewToken, NewUser, User, UserDetail,
};
