/// Alert dispatch - renders incident notifications and delivers them over
/// the configured channels (Brevo email, Telegram)
pub mod channels;
pub mod dispatcher;
pub mod render;
pub mod settings;

pub use channels::{AlertChannel, ChannelError, ChannelSettings, EmailChannel, TelegramChannel};
pub use dispatcher::{AlertDispatcher, Dispatch};
pub use render::AlertMessage;
pub use settings::AlertSettings;
