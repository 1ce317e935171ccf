//! Database entities.

#![allow(missing_docs)]

pub mod announcement;
pub mod community_feedback;
pub mod food_donation;
pub mod food_reservation;
pub mod moderation_log;
pub mod post_comment;
pub mod post_like;
pub mod post_save;
pub mod post_share;
pub mod user_account;
pub mod user_report;

pub use announcement::Entity as Announcement;
pub use community_feedback::Entity as CommunityFeedback;
pub use food_donation::Entity as FoodDonation;
pub use food_reservation::Entity as FoodReservation;
pub use moderation_log::Entity as ModerationLog;
pub use post_comment::Entity as PostComment;
pub use post_like::Entity as PostLike;
pub use post_save::Entity as PostSave;
pub use post_share::Entity as PostShare;
pub use user_account::Entity as UserAccount;
pub use user_report::Entity as UserReport;
