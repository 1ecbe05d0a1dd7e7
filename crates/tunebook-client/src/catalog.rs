//! The fixed set of remote operations.
//!
//! Names, argument counts and call classes must match the deployed service
//! exactly; the table below is the single place they are written down.

use std::fmt;

/// Whether a call may change backend state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallClass {
    /// Read-only and freely retryable.
    Query,
    /// May mutate state. Not assumed idempotent.
    Update,
}

impl CallClass {
    /// Gateway path segment for this class.
    pub fn path_segment(self) -> &'static str {
        match self {
            CallClass::Query => "query",
            CallClass::Update => "call",
        }
    }

    pub fn is_retry_safe(self) -> bool {
        matches!(self, CallClass::Query)
    }
}

impl fmt::Display for CallClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallClass::Query => f.write_str("query"),
            CallClass::Update => f.write_str("update"),
        }
    }
}

/// Page size used by every paginated listing except the per-user tune list.
pub const DEFAULT_PAGE_SIZE: u32 = 15;

/// Page size of `get_user_tune_list`.
pub const USER_TUNE_PAGE_SIZE: u32 = 8;

macro_rules! catalog {
    ($( $variant:ident => $name:literal, $class:ident, $arity:literal; )*) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Method {
            $( $variant, )*
        }

        impl Method {
            pub const ALL: &'static [Method] = &[ $( Method::$variant, )* ];

            /// Wire name of the operation.
            pub fn name(self) -> &'static str {
                match self {
                    $( Method::$variant => $name, )*
                }
            }

            pub fn class(self) -> CallClass {
                match self {
                    $( Method::$variant => CallClass::$class, )*
                }
            }

            /// Number of positional arguments.
            pub fn arity(self) -> usize {
                match self {
                    $( Method::$variant => $arity, )*
                }
            }

            pub fn from_name(name: &str) -> Option<Method> {
                match name {
                    $( $name => Some(Method::$variant), )*
                    _ => None,
                }
            }
        }
    };
}

catalog! {
    // -- Profiles --
    Authentication => "authentication", Query, 1;
    GetProfile => "get_profile", Query, 1;
    UpdateProfile => "update_profile", Update, 6;
    GetProfileCount => "get_profile_count", Query, 0;

    // -- Friends --
    GetFriends => "get_friends", Query, 1;
    BrowsePeople => "browse_people", Query, 3;
    SendFriendRequest => "send_friend_request", Update, 2;
    AcceptFriendRequest => "accept_friend_request", Update, 2;
    CancelFriendRequest => "cancel_friend_request", Update, 2;

    // -- Tunes --
    AddTune => "add_tune", Update, 5;
    UpdateTune => "update_tune", Update, 5;
    RemoveTune => "remove_tune", Update, 2;
    GetUserTuneList => "get_user_tune_list", Query, 2;
    GetUserTune => "get_user_tune", Query, 2;
    GetNewTunesFromFriends => "get_new_tunes_from_friends", Query, 1;
    GetOriginalTune => "get_original_tune", Query, 1;
    GetOriginalTuneList => "get_original_tune_list", Query, 1;
    FilterTunes => "filter_tunes", Query, 4;
    GetTuneCount => "get_tune_count", Query, 0;
    UpdateData => "update_data", Update, 0;

    // -- Sessions --
    AddSession => "add_session", Update, 8;
    UpdateSession => "update_session", Update, 9;
    DeleteSession => "delete_session", Update, 2;
    GetSessions => "get_sessions", Query, 2;
    GetSessionCount => "get_session_count", Query, 0;

    // -- Forums --
    AddForum => "add_forum", Update, 4;
    DeleteForum => "delete_forum", Update, 2;
    GetForums => "get_forums", Query, 2;
    AddPostToForum => "add_post_to_forum", Update, 5;
    UpdateForumPost => "update_forum_post", Update, 4;
    DeletePost => "delete_post", Update, 2;
    LikePost => "like_post", Update, 2;
    GetForumPosts => "get_forum_posts", Query, 2;
    GetForumPostsWithoutPhotos => "get_forum_posts_without_photos", Query, 2;
    GetPostPhotos => "get_post_photos", Query, 1;

    // -- Marketplace --
    AddInstrument => "add_instrument", Update, 9;
    DeleteInstrument => "delete_instrument", Update, 2;
    GetInstruments => "get_instruments", Query, 2;
}

impl Method {
    /// Items per page for paginated listings, `None` for everything else.
    ///
    /// The interface does not carry page sizes; these are the values the
    /// backend slices with.
    pub fn page_size(self) -> Option<u32> {
        match self {
            Method::GetUserTuneList => Some(USER_TUNE_PAGE_SIZE),
            Method::BrowsePeople
            | Method::GetOriginalTuneList
            | Method::FilterTunes
            | Method::GetSessions
            | Method::GetForums
            | Method::GetForumPosts
            | Method::GetForumPostsWithoutPhotos
            | Method::GetInstruments => Some(DEFAULT_PAGE_SIZE),
            _ => None,
        }
    }

    pub fn is_paginated(self) -> bool {
        self.page_size().is_some()
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
