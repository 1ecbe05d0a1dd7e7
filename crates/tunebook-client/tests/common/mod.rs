//! In-memory stand-in for the service, used by the integration tests.
//!
//! It answers every catalog method with the documented shapes and follows
//! the observable rules the client relies on (duplicate rejection, friend
//! request bookkeeping, page slicing). It is a test double, not a backend.
#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use tunebook_client::catalog::{DEFAULT_PAGE_SIZE, USER_TUNE_PAGE_SIZE};
use tunebook_client::client::TUNE_NOT_FOUND;
use tunebook_client::{CallRequest, ClientError, Method, Transport, TunebookClient};
use tunebook_types::models::{
    Forum, ForumData, Friend, Instrument, Profile, Relation, Session, Tune, Tuneinfo,
};
use tunebook_types::{OptList, Principal, Reply};

pub const USERNAME_TAKEN: u32 = 5;

#[derive(Default)]
struct State {
    profiles: BTreeMap<Principal, Profile>,
    tunes: BTreeMap<String, Tune>,
    sessions: BTreeMap<u32, Session>,
    forums: BTreeMap<u64, Forum>,
    posts: BTreeMap<u64, ForumData>,
    likes: BTreeMap<u64, Vec<Principal>>,
    instruments: BTreeMap<u32, Instrument>,
    next_id: u64,
    clock: u64,
    calls: Vec<CallRequest>,
}

impl State {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1_000_000_000;
        self.clock
    }
}

#[derive(Clone, Default)]
pub struct MemoryBackend {
    state: Arc<Mutex<State>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed catalog tunes that belong to nobody.
    pub fn with_catalog(self, tunes: &[(&str, &str)]) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            for (title, body) in tunes {
                let timestamp = state.tick();
                state.tunes.insert(
                    title.to_string(),
                    Tune {
                        title: title.to_string(),
                        username: None,
                        is_original: true,
                        timestamp,
                        principals: vec![],
                        notation: Some(body.to_string()),
                    },
                );
            }
        }
        self
    }

    pub fn client(&self) -> TunebookClient {
        TunebookClient::new(Arc::new(self.clone()))
    }

    pub fn calls(&self) -> Vec<CallRequest> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn last_call(&self) -> CallRequest {
        self.calls().pop().expect("no calls recorded")
    }

    fn handle(&self, req: &CallRequest) -> Result<Reply, ClientError> {
        let mut guard = self.state.lock().unwrap();
        let s = &mut *guard;
        s.calls.push(req.clone());

        let reply = match req.method {
            Method::Authentication | Method::GetProfile => {
                let p: Principal = arg(req, 0);
                one(OptList(s.profiles.get(&p).cloned()))
            }
            Method::UpdateProfile => {
                let p: Principal = arg(req, 0);
                let username: String = arg(req, 1);
                if s
                    .profiles
                    .values()
                    .any(|other| other.username == username && other.principal != p)
                {
                    return Err(ClientError::Rejected {
                        method: req.method,
                        code: USERNAME_TAKEN,
                        message: format!("Username '{username}' is already taken"),
                    });
                }
                let bio: String = arg(req, 4);
                let existing = s.profiles.get(&p).cloned();
                let profile = Profile {
                    principal: p.clone(),
                    username,
                    location: arg(req, 2),
                    instruments: arg(req, 3),
                    bio: Some(bio).filter(|b| !b.is_empty()),
                    avatar: arg(req, 5),
                    friends: existing.as_ref().map(|e| e.friends.clone()).unwrap_or_default(),
                    incoming_requests: existing
                        .as_ref()
                        .map(|e| e.incoming_requests.clone())
                        .unwrap_or_default(),
                    outgoing_requests: existing
                        .map(|e| e.outgoing_requests)
                        .unwrap_or_default(),
                };
                s.profiles.insert(p, profile.clone());
                one(profile)
            }
            Method::GetProfileCount => one(s.profiles.len() as u64),

            Method::GetFriends => {
                let p: Principal = arg(req, 0);
                let friends: Vec<Friend> = s
                    .profiles
                    .get(&p)
                    .map(|profile| {
                        profile
                            .friends
                            .iter()
                            .filter_map(|f| s.profiles.get(f))
                            .map(as_friend)
                            .collect()
                    })
                    .unwrap_or_default();
                one(friends)
            }
            Method::BrowsePeople => {
                let p: Principal = arg(req, 0);
                let search: String = arg(req, 1);
                let page: i32 = arg(req, 2);
                let Some(me) = s.profiles.get(&p) else {
                    return Ok(page_reply(Vec::<Friend>::new(), 0));
                };
                let matches: Vec<Friend> = s
                    .profiles
                    .values()
                    .filter(|other| {
                        other.principal != p
                            && other.username.to_lowercase().contains(&search.to_lowercase())
                            && me.relation_to(&other.principal)
                                == Relation::Stranger
                    })
                    .map(as_friend)
                    .collect();
                let total = matches.len() as i32;
                page_reply(slice(&matches, page, DEFAULT_PAGE_SIZE), total)
            }
            Method::SendFriendRequest => {
                let from: Principal = arg(req, 0);
                let to: Principal = arg(req, 1);
                let (Some(sender), Some(receiver)) =
                    (s.profiles.get(&from).cloned(), s.profiles.get(&to).cloned())
                else {
                    return Ok(one(OptList::<Friend>(None)));
                };
                if from == to
                    || sender.relation_to(&to) != Relation::Stranger
                {
                    return Ok(one(OptList::<Friend>(None)));
                }
                let outgoing = as_friend(&receiver);
                let incoming = as_friend(&sender);
                if let Some(profile) = s.profiles.get_mut(&from) {
                    profile.outgoing_requests.push(outgoing.clone());
                }
                if let Some(profile) = s.profiles.get_mut(&to) {
                    profile.incoming_requests.push(incoming);
                }
                one(OptList(Some(outgoing)))
            }
            Method::AcceptFriendRequest => {
                let me: Principal = arg(req, 0);
                let requester: Principal = arg(req, 1);
                let pending = s
                    .profiles
                    .get(&me)
                    .is_some_and(|p| p.relation_to(&requester) == Relation::IncomingRequest);
                if !pending || !s.profiles.contains_key(&requester) {
                    return Ok(one(false));
                }
                if let Some(profile) = s.profiles.get_mut(&me) {
                    profile.incoming_requests.retain(|f| f.principal != requester);
                    profile.friends.push(requester.clone());
                }
                if let Some(profile) = s.profiles.get_mut(&requester) {
                    profile.outgoing_requests.retain(|f| f.principal != me);
                    profile.friends.push(me.clone());
                }
                one(true)
            }
            Method::CancelFriendRequest => {
                let me: Principal = arg(req, 0);
                let other: Principal = arg(req, 1);
                let pending = s
                    .profiles
                    .get(&me)
                    .is_some_and(|p| p.relation_to(&other) == Relation::OutgoingRequest);
                if !pending {
                    return Ok(one(false));
                }
                if let Some(profile) = s.profiles.get_mut(&me) {
                    profile.outgoing_requests.retain(|f| f.principal != other);
                }
                if let Some(profile) = s.profiles.get_mut(&other) {
                    profile.incoming_requests.retain(|f| f.principal != me);
                }
                one(true)
            }

            Method::AddTune => {
                let p: Principal = arg(req, 0);
                let title: String = arg(req, 1);
                let timestamp = s.tick();
                let mut principals = match s.tunes.get(&title) {
                    Some(tune) if tune.principals.contains(&p) => return Ok(one(false)),
                    Some(tune) => tune.principals.clone(),
                    None => vec![],
                };
                principals.push(p);
                let username: String = arg(req, 4);
                s.tunes.insert(
                    title.clone(),
                    Tune {
                        title,
                        username: Some(username).filter(|u| !u.is_empty()),
                        is_original: arg(req, 3),
                        timestamp,
                        principals,
                        notation: Some(arg(req, 2)),
                    },
                );
                one(true)
            }
            Method::UpdateTune => {
                let p: Principal = arg(req, 0);
                let title: String = arg(req, 1);
                let timestamp = s.tick();
                match s.tunes.get_mut(&title) {
                    Some(tune) if tune.principals.contains(&p) => {
                        tune.notation = Some(arg(req, 2));
                        tune.is_original = arg(req, 3);
                        tune.timestamp = timestamp;
                        one(true)
                    }
                    _ => one(false),
                }
            }
            Method::RemoveTune => {
                let p: Principal = arg(req, 0);
                let title: String = arg(req, 1);
                match s.tunes.get_mut(&title) {
                    Some(tune) if tune.principals.contains(&p) => {
                        tune.principals.retain(|owner| owner != &p);
                        one(true)
                    }
                    _ => one(false),
                }
            }
            Method::GetUserTuneList => {
                let p: Principal = arg(req, 0);
                let page: i32 = arg(req, 1);
                let mine: Vec<Tuneinfo> = s
                    .tunes
                    .values()
                    .filter(|t| t.principals.contains(&p))
                    .cloned()
                    .map(Tuneinfo::from)
                    .collect();
                let total = mine.len() as i32;
                page_reply(slice(&mine, page, USER_TUNE_PAGE_SIZE), total)
            }
            Method::GetUserTune => {
                let p: Principal = arg(req, 0);
                let title: String = arg(req, 1);
                let body = s
                    .tunes
                    .get(&title)
                    .filter(|t| t.principals.contains(&p))
                    .and_then(|t| t.notation.clone())
                    .unwrap_or_default();
                one(body)
            }
            Method::GetNewTunesFromFriends => {
                let p: Principal = arg(req, 0);
                let friends = s.profiles.get(&p).map(|pr| pr.friends.clone()).unwrap_or_default();
                let tunes: Vec<Tune> = s
                    .tunes
                    .values()
                    .filter(|t| t.principals.iter().any(|owner| friends.contains(owner)))
                    .cloned()
                    .collect();
                one(tunes)
            }
            Method::GetOriginalTune => {
                let title: String = arg(req, 0);
                let body = s
                    .tunes
                    .get(&title)
                    .and_then(|t| t.notation.clone())
                    .unwrap_or_else(|| TUNE_NOT_FOUND.to_string());
                one(body)
            }
            Method::GetOriginalTuneList => {
                let page: i32 = arg(req, 0);
                let titles: Vec<String> = s.tunes.keys().cloned().collect();
                let total = titles.len() as i32;
                page_reply(slice(&titles, page, DEFAULT_PAGE_SIZE), total)
            }
            Method::FilterTunes => {
                let title: String = arg(req, 0);
                let rhythm: String = arg(req, 1);
                let key: String = arg(req, 2);
                let page: i32 = arg(req, 3);
                let hits: Vec<Tuneinfo> = s
                    .tunes
                    .values()
                    .filter(|t| t.title.to_lowercase().contains(&title.to_lowercase()))
                    .filter(|t| header_matches(t, "R:", &rhythm) && header_matches(t, "K:", &key))
                    .cloned()
                    .map(Tuneinfo::from)
                    .collect();
                let total = hits.len() as i32;
                page_reply(slice(&hits, page, DEFAULT_PAGE_SIZE), total)
            }
            Method::GetTuneCount => one(s.tunes.len() as u64),
            Method::UpdateData => Reply(vec![]),

            Method::AddSession => {
                let id = s.next_id() as u32;
                let session = Session {
                    id,
                    principal: arg(req, 0),
                    username: arg(req, 1),
                    name: arg(req, 2),
                    location: arg(req, 3),
                    datetime: arg(req, 4),
                    contact: arg(req, 5),
                    comment: arg(req, 6),
                    recurrence: arg(req, 7),
                };
                s.sessions.insert(id, session);
                one(true)
            }
            Method::UpdateSession => {
                let id: u32 = arg(req, 0);
                let p: Principal = arg(req, 1);
                match s.sessions.get_mut(&id) {
                    Some(session) if session.principal == p => {
                        session.username = arg(req, 2);
                        session.name = arg(req, 3);
                        session.location = arg(req, 4);
                        session.datetime = arg(req, 5);
                        session.contact = arg(req, 6);
                        session.comment = arg(req, 7);
                        session.recurrence = arg(req, 8);
                        one(true)
                    }
                    _ => one(false),
                }
            }
            Method::DeleteSession => {
                let id: u32 = arg(req, 0);
                let p: Principal = arg(req, 1);
                let owned = s.sessions.get(&id).is_some_and(|session| session.principal == p);
                if owned {
                    s.sessions.remove(&id);
                }
                one(owned)
            }
            Method::GetSessions => {
                let search: String = arg(req, 0);
                let page: i32 = arg(req, 1);
                let needle = search.to_lowercase();
                let hits: Vec<Session> = s
                    .sessions
                    .values()
                    .filter(|session| {
                        session.name.to_lowercase().contains(&needle)
                            || session.location.to_lowercase().contains(&needle)
                    })
                    .cloned()
                    .collect();
                let total = hits.len() as i32;
                page_reply(slice(&hits, page, DEFAULT_PAGE_SIZE), total)
            }
            Method::GetSessionCount => one(s.sessions.len() as u64),

            Method::AddForum => {
                let id = s.next_id();
                let created_at = s.tick();
                let creator: Principal = arg(req, 0);
                let forum = Forum {
                    id,
                    username: arg(req, 1),
                    name: arg(req, 2),
                    comment: arg(req, 3),
                    threads: None,
                    created_at,
                    principals: vec![creator.clone()],
                    creator,
                    last_updated_at: None,
                };
                s.forums.insert(id, forum);
                one(true)
            }
            Method::DeleteForum => {
                let id: u64 = arg(req, 0);
                let p: Principal = arg(req, 1);
                let owned = s.forums.get(&id).is_some_and(|f| f.creator == p);
                if owned {
                    s.forums.remove(&id);
                    s.posts.retain(|_, post| post.forum_id != Some(id));
                }
                one(owned)
            }
            Method::GetForums => {
                let search: String = arg(req, 0);
                let page: i32 = arg(req, 1);
                let hits: Vec<Forum> = s
                    .forums
                    .values()
                    .filter(|f| f.name.to_lowercase().contains(&search.to_lowercase()))
                    .cloned()
                    .collect();
                let total = hits.len() as i32;
                page_reply(slice(&hits, page, DEFAULT_PAGE_SIZE), total)
            }
            Method::AddPostToForum => {
                let forum_id: u64 = arg(req, 0);
                if !s.forums.contains_key(&forum_id) {
                    return Ok(one(false));
                }
                let id = s.next_id();
                let created_at = s.tick();
                let photos: Vec<Vec<u8>> = arg(req, 4);
                let post = ForumData {
                    id,
                    forum_id: Some(forum_id),
                    updated_at: None,
                    username: arg(req, 1),
                    principal: arg(req, 2),
                    comment: arg(req, 3),
                    created_at,
                    likes: 0,
                    photos: Some(photos).filter(|p| !p.is_empty()),
                };
                s.posts.insert(id, post);
                if let Some(forum) = s.forums.get_mut(&forum_id) {
                    forum.threads.get_or_insert_with(Vec::new).push(id);
                    forum.last_updated_at = Some(created_at);
                }
                one(true)
            }
            Method::UpdateForumPost => {
                let id: u64 = arg(req, 0);
                let p: Principal = arg(req, 1);
                let text: OptList<String> = arg(req, 2);
                let photos: OptList<Vec<Vec<u8>>> = arg(req, 3);
                let now = s.tick();
                match s.posts.get_mut(&id) {
                    Some(post) if post.principal == p => {
                        if let Some(text) = text.into_inner() {
                            post.comment = text;
                        }
                        if let Some(photos) = photos.into_inner() {
                            post.photos = Some(photos);
                        }
                        post.updated_at = Some(now);
                        one(true)
                    }
                    _ => one(false),
                }
            }
            Method::DeletePost => {
                let id: u64 = arg(req, 0);
                let p: Principal = arg(req, 1);
                let owned = s.posts.get(&id).is_some_and(|post| post.principal == p);
                if owned {
                    s.posts.remove(&id);
                }
                one(owned)
            }
            Method::LikePost => {
                let id: u64 = arg(req, 0);
                let p: Principal = arg(req, 1);
                if !s.posts.contains_key(&id) {
                    return Ok(one(false));
                }
                let likers = s.likes.entry(id).or_default();
                if likers.contains(&p) {
                    return Ok(one(false));
                }
                likers.push(p);
                if let Some(post) = s.posts.get_mut(&id) {
                    post.likes += 1;
                }
                one(true)
            }
            Method::GetForumPosts | Method::GetForumPostsWithoutPhotos => {
                let forum_id: u64 = arg(req, 0);
                let page: i32 = arg(req, 1);
                let strip = req.method == Method::GetForumPostsWithoutPhotos;
                let posts: Vec<ForumData> = s
                    .posts
                    .values()
                    .filter(|post| post.forum_id == Some(forum_id))
                    .cloned()
                    .map(|mut post| {
                        if strip {
                            post.photos = None;
                        }
                        post
                    })
                    .collect();
                let total = posts.len() as i32;
                page_reply(slice(&posts, page, DEFAULT_PAGE_SIZE), total)
            }
            Method::GetPostPhotos => {
                let id: u64 = arg(req, 0);
                let photos = s
                    .posts
                    .get(&id)
                    .and_then(|post| post.photos.clone())
                    .unwrap_or_default();
                one(photos)
            }

            Method::AddInstrument => {
                let id = s.next_id() as u32;
                let listing = Instrument {
                    id,
                    seller_principal: arg(req, 0),
                    buyer_principal: arg(req, 1),
                    username: arg(req, 2),
                    name: arg(req, 3),
                    location: arg(req, 4),
                    product: arg(req, 5),
                    comment: arg(req, 6),
                    price: arg(req, 7),
                    photos: arg(req, 8),
                };
                s.instruments.insert(id, listing);
                one(true)
            }
            Method::DeleteInstrument => {
                let id: u32 = arg(req, 0);
                let p: Principal = arg(req, 1);
                let owned = s.instruments.get(&id).is_some_and(|i| i.seller_principal == p);
                if owned {
                    s.instruments.remove(&id);
                }
                one(owned)
            }
            Method::GetInstruments => {
                let search: String = arg(req, 0);
                let page: i32 = arg(req, 1);
                let hits: Vec<Instrument> = s
                    .instruments
                    .values()
                    .filter(|i| i.name.to_lowercase().contains(&search.to_lowercase()))
                    .cloned()
                    .collect();
                let total = hits.len() as i32;
                page_reply(slice(&hits, page, DEFAULT_PAGE_SIZE), total)
            }
        };

        Ok(reply)
    }
}

#[async_trait]
impl Transport for MemoryBackend {
    async fn call(&self, request: CallRequest) -> Result<Reply, ClientError> {
        assert_eq!(
            request.args.len(),
            request.method.arity(),
            "{} called with wrong argument count",
            request.method
        );
        self.handle(&request)
    }
}

fn arg<T: DeserializeOwned>(req: &CallRequest, index: usize) -> T {
    serde_json::from_value(req.args[index].clone())
        .unwrap_or_else(|e| panic!("{} argument {index}: {e}", req.method))
}

fn one<T: Serialize>(value: T) -> Reply {
    Reply(vec![serde_json::to_value(value).unwrap()])
}

fn page_reply<T: Serialize>(items: Vec<T>, total: i32) -> Reply {
    Reply(vec![serde_json::to_value(items).unwrap(), Value::from(total)])
}

fn slice<T: Clone>(items: &[T], page: i32, size: u32) -> Vec<T> {
    if page < 0 {
        return items.to_vec();
    }
    items
        .iter()
        .skip(page as usize * size as usize)
        .take(size as usize)
        .cloned()
        .collect()
}

fn as_friend(profile: &Profile) -> Friend {
    Friend {
        principal: profile.principal.clone(),
        username: profile.username.clone(),
        avatar: profile.avatar.clone(),
    }
}

fn header_matches(tune: &Tune, field: &str, wanted: &str) -> bool {
    if wanted == "all" {
        return true;
    }
    tune.notation.as_deref().unwrap_or_default().lines().any(|line| {
        line.strip_prefix(field)
            .is_some_and(|rest| rest.trim_start().starts_with(wanted))
    })
}
