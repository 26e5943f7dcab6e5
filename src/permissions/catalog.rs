// src/permissions/catalog.rs
use poise::serenity_prelude::Permissions;

/// One togglable channel permission
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PermissionFlag {
    ViewChannel,
    SendMessages,
    ManageMessages,
    EmbedLinks,
    AttachFiles,
    ReadMessageHistory,
    AddReactions,
    MentionEveryone,
    UseExternalEmojis,
    Connect,
    Speak,
    MuteMembers,
    DeafenMembers,
    MoveMembers,
}

impl PermissionFlag {
    /// Every flag in catalog order. Index in this slice is the flag's slot in `OverwriteSettings`.
    pub const ALL: [PermissionFlag; 14] = [
        PermissionFlag::ViewChannel,
        PermissionFlag::SendMessages,
        PermissionFlag::ManageMessages,
        PermissionFlag::EmbedLinks,
        PermissionFlag::AttachFiles,
        PermissionFlag::ReadMessageHistory,
        PermissionFlag::AddReactions,
        PermissionFlag::MentionEveryone,
        PermissionFlag::UseExternalEmojis,
        PermissionFlag::Connect,
        PermissionFlag::Speak,
        PermissionFlag::MuteMembers,
        PermissionFlag::DeafenMembers,
        PermissionFlag::MoveMembers,
    ];

    /// Key used in the data file and in component IDs
    pub fn key(self) -> &'static str {
        match self {
            PermissionFlag::ViewChannel => "view_channel",
            PermissionFlag::SendMessages => "send_messages",
            PermissionFlag::ManageMessages => "manage_messages",
            PermissionFlag::EmbedLinks => "embed_links",
            PermissionFlag::AttachFiles => "attach_files",
            PermissionFlag::ReadMessageHistory => "read_message_history",
            PermissionFlag::AddReactions => "add_reactions",
            PermissionFlag::MentionEveryone => "mention_everyone",
            PermissionFlag::UseExternalEmojis => "use_external_emojis",
            PermissionFlag::Connect => "connect",
            PermissionFlag::Speak => "speak",
            PermissionFlag::MuteMembers => "mute_members",
            PermissionFlag::DeafenMembers => "deafen_members",
            PermissionFlag::MoveMembers => "move_members",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            PermissionFlag::ViewChannel => "View Channel",
            PermissionFlag::SendMessages => "Send Messages",
            PermissionFlag::ManageMessages => "Manage Messages",
            PermissionFlag::EmbedLinks => "Embed Links",
            PermissionFlag::AttachFiles => "Attach Files",
            PermissionFlag::ReadMessageHistory => "Read Message History",
            PermissionFlag::AddReactions => "Add Reactions",
            PermissionFlag::MentionEveryone => "Mention Everyone",
            PermissionFlag::UseExternalEmojis => "Use External Emojis",
            PermissionFlag::Connect => "Connect",
            PermissionFlag::Speak => "Speak",
            PermissionFlag::MuteMembers => "Mute Members",
            PermissionFlag::DeafenMembers => "Deafen Members",
            PermissionFlag::MoveMembers => "Move Members",
        }
    }

    /// The Discord permission bit this flag controls
    pub fn permission(self) -> Permissions {
        match self {
            PermissionFlag::ViewChannel => Permissions::VIEW_CHANNEL,
            PermissionFlag::SendMessages => Permissions::SEND_MESSAGES,
            PermissionFlag::ManageMessages => Permissions::MANAGE_MESSAGES,
            PermissionFlag::EmbedLinks => Permissions::EMBED_LINKS,
            PermissionFlag::AttachFiles => Permissions::ATTACH_FILES,
            PermissionFlag::ReadMessageHistory => Permissions::READ_MESSAGE_HISTORY,
            PermissionFlag::AddReactions => Permissions::ADD_REACTIONS,
            PermissionFlag::MentionEveryone => Permissions::MENTION_EVERYONE,
            PermissionFlag::UseExternalEmojis => Permissions::USE_EXTERNAL_EMOJIS,
            PermissionFlag::Connect => Permissions::CONNECT,
            PermissionFlag::Speak => Permissions::SPEAK,
            PermissionFlag::MuteMembers => Permissions::MUTE_MEMBERS,
            PermissionFlag::DeafenMembers => Permissions::DEAFEN_MEMBERS,
            PermissionFlag::MoveMembers => Permissions::MOVE_MEMBERS,
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|flag| flag.key() == key)
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}
