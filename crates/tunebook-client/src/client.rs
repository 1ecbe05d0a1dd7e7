use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use tunebook_types::api::{
    ForumPostDraft, ForumPostEdit, InstrumentListing, NewForum, ProfileUpdate, SessionDraft,
    TuneDraft, TuneFilter,
};
use tunebook_types::models::{Forum, ForumData, Friend, Instrument, Profile, Session, Tune, Tuneinfo};
use tunebook_types::wire::encode_arg;
use tunebook_types::{OptList, Page, Principal, Reply};

use crate::catalog::Method;
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::http::HttpTransport;
use crate::session::Identity;
use crate::transport::{CallRequest, Transport};

/// What `get_original_tune` answers for an unknown title.
pub const TUNE_NOT_FOUND: &str = "Tune not found";

/// Page number that makes `get_user_tune_list` return every tune at once.
const ALL_PAGES: i32 = -1;

/// Encode positional arguments, tagging failures with the method.
macro_rules! args {
    ($method:expr $(, $arg:expr)* $(,)?) => {{
        #[allow(unused_variables)]
        let method: Method = $method;
        let encoded: Vec<Value> = vec![
            $( encode_arg(&$arg).map_err(|source| ClientError::Encode { method, source })?, )*
        ];
        encoded
    }};
}

/// Typed wrapper over the operation catalog.
///
/// Cheap to clone; clones share the transport. The bound [`Identity`] is
/// attached to every call as the sender. Argument principals are still
/// passed explicitly because the service signatures take them.
#[derive(Clone)]
pub struct TunebookClient {
    transport: Arc<dyn Transport>,
    identity: Identity,
}

impl TunebookClient {
    /// Anonymous client over an arbitrary transport.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            identity: Identity::Anonymous,
        }
    }

    /// Anonymous client over HTTP.
    pub fn connect(config: ClientConfig) -> Result<Self, ClientError> {
        Ok(Self::new(Arc::new(HttpTransport::new(config)?)))
    }

    /// Same transport, different caller.
    pub fn with_identity(&self, identity: Identity) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            identity,
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    // -- Profiles --

    /// Profile of `principal`, or `None` if it has never saved one.
    pub async fn authentication(&self, principal: &Principal) -> Result<Option<Profile>, ClientError> {
        let method = Method::Authentication;
        self.optional(method, args!(method, principal)).await
    }

    pub async fn get_profile(&self, principal: &Principal) -> Result<Option<Profile>, ClientError> {
        let method = Method::GetProfile;
        self.optional(method, args!(method, principal)).await
    }

    /// Create or replace the caller's profile. A taken username comes back
    /// as [`ClientError::Rejected`].
    pub async fn update_profile(
        &self,
        principal: &Principal,
        update: &ProfileUpdate,
    ) -> Result<Profile, ClientError> {
        let method = Method::UpdateProfile;
        let bio = update.bio.as_deref().unwrap_or("");
        let args = args!(
            method,
            principal,
            update.username,
            update.location,
            update.instruments,
            bio,
            update.avatar,
        );
        self.single(method, args).await
    }

    pub async fn get_profile_count(&self) -> Result<u64, ClientError> {
        let method = Method::GetProfileCount;
        self.single(method, args!(method)).await
    }

    // -- Friends --

    pub async fn get_friends(&self, principal: &Principal) -> Result<Vec<Friend>, ClientError> {
        let method = Method::GetFriends;
        self.single(method, args!(method, principal)).await
    }

    /// People matching `search` who are not yet friends or pending requests.
    pub async fn browse_people(
        &self,
        principal: &Principal,
        search: &str,
        page: i32,
    ) -> Result<Page<Friend>, ClientError> {
        let method = Method::BrowsePeople;
        self.page(method, args!(method, principal, search, page)).await
    }

    /// `None` when the request was not created (unknown user, already
    /// friends, or a request already pending either way).
    pub async fn send_friend_request(
        &self,
        principal: &Principal,
        target: &Principal,
    ) -> Result<Option<Friend>, ClientError> {
        let method = Method::SendFriendRequest;
        self.optional(method, args!(method, principal, target)).await
    }

    pub async fn accept_friend_request(
        &self,
        principal: &Principal,
        requester: &Principal,
    ) -> Result<bool, ClientError> {
        let method = Method::AcceptFriendRequest;
        self.flag(method, args!(method, principal, requester)).await
    }

    pub async fn cancel_friend_request(
        &self,
        principal: &Principal,
        other: &Principal,
    ) -> Result<bool, ClientError> {
        let method = Method::CancelFriendRequest;
        self.flag(method, args!(method, principal, other)).await
    }

    // -- Tunes --

    /// `false` if the principal already has a tune with this title.
    pub async fn add_tune(&self, principal: &Principal, tune: &TuneDraft) -> Result<bool, ClientError> {
        let method = Method::AddTune;
        self.flag(method, tune_args(method, principal, tune)?).await
    }

    pub async fn update_tune(&self, principal: &Principal, tune: &TuneDraft) -> Result<bool, ClientError> {
        let method = Method::UpdateTune;
        self.flag(method, tune_args(method, principal, tune)?).await
    }

    pub async fn remove_tune(&self, principal: &Principal, title: &str) -> Result<bool, ClientError> {
        let method = Method::RemoveTune;
        self.flag(method, args!(method, principal, title)).await
    }

    pub async fn get_user_tune_list(
        &self,
        principal: &Principal,
        page: i32,
    ) -> Result<Page<Tuneinfo>, ClientError> {
        let method = Method::GetUserTuneList;
        self.page(method, args!(method, principal, page)).await
    }

    /// Every tune in the principal's collection, in one round trip.
    pub async fn get_all_user_tunes(&self, principal: &Principal) -> Result<Vec<Tuneinfo>, ClientError> {
        let method = Method::GetUserTuneList;
        let page: Page<Tuneinfo> = self.page(method, args!(method, principal, ALL_PAGES)).await?;
        Ok(page.items)
    }

    /// Notation of one of the principal's tunes. `None` if they do not own it.
    pub async fn get_user_tune(
        &self,
        principal: &Principal,
        title: &str,
    ) -> Result<Option<String>, ClientError> {
        let method = Method::GetUserTune;
        let body: String = self.single(method, args!(method, principal, title)).await?;
        Ok(Some(body).filter(|b| !b.is_empty()))
    }

    pub async fn get_new_tunes_from_friends(&self, principal: &Principal) -> Result<Vec<Tune>, ClientError> {
        let method = Method::GetNewTunesFromFriends;
        self.single(method, args!(method, principal)).await
    }

    /// Notation of a catalog tune. `None` for unknown titles.
    pub async fn get_original_tune(&self, title: &str) -> Result<Option<String>, ClientError> {
        let method = Method::GetOriginalTune;
        let body: String = self.single(method, args!(method, title)).await?;
        Ok(Some(body).filter(|b| b != TUNE_NOT_FOUND))
    }

    /// Titles of the catalog tunes.
    pub async fn get_original_tune_list(&self, page: i32) -> Result<Page<String>, ClientError> {
        let method = Method::GetOriginalTuneList;
        self.page(method, args!(method, page)).await
    }

    pub async fn filter_tunes(&self, filter: &TuneFilter, page: i32) -> Result<Page<Tuneinfo>, ClientError> {
        let method = Method::FilterTunes;
        let args = args!(method, filter.title, filter.rhythm_arg(), filter.key_arg(), page);
        self.page(method, args).await
    }

    pub async fn get_tune_count(&self) -> Result<u64, ClientError> {
        let method = Method::GetTuneCount;
        self.single(method, args!(method)).await
    }

    /// Ask the backend to reseed its tune catalog if it is empty.
    pub async fn update_data(&self) -> Result<(), ClientError> {
        let method = Method::UpdateData;
        let reply = self.invoke(method, args!(method)).await?;
        reply
            .into_unit()
            .map_err(|source| ClientError::Decode { method, source })
    }

    // -- Sessions --

    pub async fn add_session(
        &self,
        principal: &Principal,
        session: &SessionDraft,
    ) -> Result<bool, ClientError> {
        let method = Method::AddSession;
        let args = args!(
            method,
            principal,
            session.username,
            session.name,
            session.location,
            session.datetime,
            session.contact,
            session.comment,
            session.recurrence_arg(),
        );
        self.flag(method, args).await
    }

    pub async fn update_session(
        &self,
        id: u32,
        principal: &Principal,
        session: &SessionDraft,
    ) -> Result<bool, ClientError> {
        let method = Method::UpdateSession;
        let args = args!(
            method,
            id,
            principal,
            session.username,
            session.name,
            session.location,
            session.datetime,
            session.contact,
            session.comment,
            session.recurrence_arg(),
        );
        self.flag(method, args).await
    }

    pub async fn delete_session(&self, id: u32, principal: &Principal) -> Result<bool, ClientError> {
        let method = Method::DeleteSession;
        self.flag(method, args!(method, id, principal)).await
    }

    /// Sessions whose name or location contains `search`.
    pub async fn get_sessions(&self, search: &str, page: i32) -> Result<Page<Session>, ClientError> {
        let method = Method::GetSessions;
        self.page(method, args!(method, search, page)).await
    }

    pub async fn get_session_count(&self) -> Result<u64, ClientError> {
        let method = Method::GetSessionCount;
        self.single(method, args!(method)).await
    }

    // -- Forums --

    pub async fn add_forum(&self, principal: &Principal, forum: &NewForum) -> Result<bool, ClientError> {
        let method = Method::AddForum;
        let args = args!(method, principal, forum.username, forum.name, forum.comment);
        self.flag(method, args).await
    }

    pub async fn delete_forum(&self, id: u64, principal: &Principal) -> Result<bool, ClientError> {
        let method = Method::DeleteForum;
        self.flag(method, args!(method, id, principal)).await
    }

    pub async fn get_forums(&self, search: &str, page: i32) -> Result<Page<Forum>, ClientError> {
        let method = Method::GetForums;
        self.page(method, args!(method, search, page)).await
    }

    pub async fn add_post_to_forum(
        &self,
        forum_id: u64,
        principal: &Principal,
        post: &ForumPostDraft,
    ) -> Result<bool, ClientError> {
        let method = Method::AddPostToForum;
        let args = args!(method, forum_id, post.username, principal, post.text, post.photos);
        self.flag(method, args).await
    }

    pub async fn update_forum_post(
        &self,
        post_id: u64,
        principal: &Principal,
        edit: &ForumPostEdit,
    ) -> Result<bool, ClientError> {
        let method = Method::UpdateForumPost;
        let text = OptList(edit.text.as_ref());
        let photos = OptList(edit.photos.as_ref());
        self.flag(method, args!(method, post_id, principal, text, photos)).await
    }

    pub async fn delete_post(&self, post_id: u64, principal: &Principal) -> Result<bool, ClientError> {
        let method = Method::DeletePost;
        self.flag(method, args!(method, post_id, principal)).await
    }

    pub async fn like_post(&self, post_id: u64, principal: &Principal) -> Result<bool, ClientError> {
        let method = Method::LikePost;
        self.flag(method, args!(method, post_id, principal)).await
    }

    pub async fn get_forum_posts(&self, forum_id: u64, page: i32) -> Result<Page<ForumData>, ClientError> {
        let method = Method::GetForumPosts;
        self.page(method, args!(method, forum_id, page)).await
    }

    /// Same listing with photo payloads stripped; fetch them per post with
    /// [`get_post_photos`](Self::get_post_photos).
    pub async fn get_forum_posts_without_photos(
        &self,
        forum_id: u64,
        page: i32,
    ) -> Result<Page<ForumData>, ClientError> {
        let method = Method::GetForumPostsWithoutPhotos;
        self.page(method, args!(method, forum_id, page)).await
    }

    pub async fn get_post_photos(&self, post_id: u64) -> Result<Vec<Vec<u8>>, ClientError> {
        let method = Method::GetPostPhotos;
        self.single(method, args!(method, post_id)).await
    }

    // -- Marketplace --

    pub async fn add_instrument(
        &self,
        principal: &Principal,
        listing: &InstrumentListing,
    ) -> Result<bool, ClientError> {
        let method = Method::AddInstrument;
        // No buyer yet.
        let buyer = Principal::default();
        let args = args!(
            method,
            principal,
            buyer,
            listing.username,
            listing.name,
            listing.location,
            listing.product,
            listing.comment,
            listing.price,
            listing.photos,
        );
        self.flag(method, args).await
    }

    pub async fn delete_instrument(&self, id: u32, principal: &Principal) -> Result<bool, ClientError> {
        let method = Method::DeleteInstrument;
        self.flag(method, args!(method, id, principal)).await
    }

    pub async fn get_instruments(&self, search: &str, page: i32) -> Result<Page<Instrument>, ClientError> {
        let method = Method::GetInstruments;
        self.page(method, args!(method, search, page)).await
    }

    // -- Plumbing --

    async fn invoke(&self, method: Method, args: Vec<Value>) -> Result<Reply, ClientError> {
        if args.len() != method.arity() {
            return Err(ClientError::ArgumentCount {
                method,
                expected: method.arity(),
                got: args.len(),
            });
        }

        let sender = self.identity.principal().cloned();
        debug!(
            %method,
            class = %method.class(),
            sender = sender.as_ref().map(Principal::as_str).unwrap_or("anonymous"),
            "calling"
        );

        self.transport
            .call(CallRequest {
                method,
                sender,
                args,
            })
            .await
    }

    async fn single<T: DeserializeOwned>(&self, method: Method, args: Vec<Value>) -> Result<T, ClientError> {
        self.invoke(method, args)
            .await?
            .into_single()
            .map_err(|source| ClientError::Decode { method, source })
    }

    async fn optional<T: DeserializeOwned>(
        &self,
        method: Method,
        args: Vec<Value>,
    ) -> Result<Option<T>, ClientError> {
        let value: OptList<T> = self.single(method, args).await?;
        Ok(value.into_inner())
    }

    async fn flag(&self, method: Method, args: Vec<Value>) -> Result<bool, ClientError> {
        let ok: bool = self.single(method, args).await?;
        if !ok {
            debug!(%method, "backend declined");
        }
        Ok(ok)
    }

    async fn page<T: DeserializeOwned>(&self, method: Method, args: Vec<Value>) -> Result<Page<T>, ClientError> {
        self.invoke(method, args)
            .await?
            .into_page()
            .map_err(|source| ClientError::Decode { method, source })
    }
}

fn tune_args(method: Method, principal: &Principal, tune: &TuneDraft) -> Result<Vec<Value>, ClientError> {
    Ok(args!(
        method,
        principal,
        tune.title,
        tune.notation,
        tune.is_original,
        tune.username,
    ))
}
