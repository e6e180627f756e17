pub mod amount;
pub mod bot_commands;
