pub mod banned_user;
pub mod comment;
pub mod message;
pub mod notification;
pub mod post;
pub mod report;
pub mod user;

pub use banned_user::Entity as BannedUser;
pub use comment::{Entity as Comment, Model as CommentModel};
pub use message::Entity as Message;
pub use notification::{Entity as Notification, Model as NotificationModel};
pub use post::{Entity as Post, Model as PostModel};
pub use report::{Entity as Report, Model as ReportModel, ReportStatus, TargetType};
pub use user::{Entity as User, Model as UserModel, Role};
