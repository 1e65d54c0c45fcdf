//! Single-consumption response bodies.

use crate::{BoxStream, Error, Result};
use bytes::{Bytes, BytesMut};
use futures::stream::Stream;
use futures::task::{waker, ArcWake};
use futures::StreamExt;
use std::collections::VecDeque;
use std::fmt;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Context, Poll, Waker};

/// A response payload that can be read exactly once.
///
/// Reading methods take `self`, so a body that has been consumed (or split with
/// [`Body::tee`]) cannot be touched again.
pub struct Body {
    inner: Inner,
}

enum Inner {
    Full(Bytes),
    Stream(BoxStream<'static, Bytes>),
}

impl Body {
    pub fn empty() -> Self {
        Self::from_bytes(Bytes::new())
    }

    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        Self {
            inner: Inner::Full(bytes.into()),
        }
    }

    pub fn from_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes>> + Send + 'static,
    {
        Self {
            inner: Inner::Stream(Box::pin(stream)),
        }
    }

    /// True when the whole payload is already in memory.
    pub fn is_buffered(&self) -> bool {
        matches!(self.inner, Inner::Full(_))
    }

    /// Read the body to completion.
    pub async fn bytes(self) -> Result<Bytes> {
        match self.inner {
            Inner::Full(bytes) => Ok(bytes),
            Inner::Stream(mut stream) => {
                let mut buf = BytesMut::new();
                while let Some(chunk) = stream.next().await {
                    buf.extend_from_slice(&chunk?);
                }
                Ok(buf.freeze())
            }
        }
    }

    pub fn into_stream(self) -> BoxStream<'static, Bytes> {
        match self.inner {
            Inner::Full(bytes) => {
                let chunks = if bytes.is_empty() { vec![] } else { vec![Ok(bytes)] };
                Box::pin(futures::stream::iter(chunks))
            }
            Inner::Stream(stream) => stream,
        }
    }

    /// Split into two independently readable copies of the same payload.
    ///
    /// Buffered bodies share their immutable bytes. Streaming bodies are read
    /// from upstream once per chunk; each copy keeps its own cursor into a shared
    /// chunk buffer, and a chunk is released once both copies have passed it (or
    /// the lagging copy was dropped).
    pub fn tee(self) -> (Body, Body) {
        match self.inner {
            Inner::Full(bytes) => (Body::from_bytes(bytes.clone()), Body::from_bytes(bytes)),
            Inner::Stream(upstream) => {
                let shared = Arc::new(TeeShared {
                    state: Mutex::new(TeeState {
                        upstream: Some(upstream),
                        chunks: VecDeque::new(),
                        base: 0,
                        cursors: [Some(0), Some(0)],
                    }),
                    wakers: Arc::new(TeeWakers::default()),
                });
                let left = TeeReader {
                    shared: shared.clone(),
                    side: 0,
                };
                let right = TeeReader { shared, side: 1 };
                (Body::from_stream(left), Body::from_stream(right))
            }
        }
    }
}

impl Default for Body {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner {
            Inner::Full(bytes) => f.debug_tuple("Body::Full").field(&bytes.len()).finish(),
            Inner::Stream(_) => f.write_str("Body::Stream"),
        }
    }
}

impl From<Bytes> for Body {
    fn from(bytes: Bytes) -> Self {
        Self::from_bytes(bytes)
    }
}

impl From<Vec<u8>> for Body {
    fn from(v: Vec<u8>) -> Self {
        Self::from_bytes(v)
    }
}

impl From<String> for Body {
    fn from(s: String) -> Self {
        Self::from_bytes(s)
    }
}

impl From<&'static str> for Body {
    fn from(s: &'static str) -> Self {
        Self::from_bytes(Bytes::from_static(s.as_bytes()))
    }
}

// Upstream errors are not `Clone`; both readers see the same message.
type Chunk = std::result::Result<Bytes, String>;

struct TeeShared {
    state: Mutex<TeeState>,
    wakers: Arc<TeeWakers>,
}

struct TeeState {
    /// `None` once upstream is exhausted.
    upstream: Option<BoxStream<'static, Bytes>>,
    chunks: VecDeque<Chunk>,
    /// Absolute index of `chunks[0]`.
    base: usize,
    /// Absolute read position per reader; `None` after the reader is dropped.
    cursors: [Option<usize>; 2],
}

impl TeeState {
    fn chunk_at(&self, pos: usize) -> Option<Chunk> {
        pos.checked_sub(self.base)
            .and_then(|i| self.chunks.get(i))
            .cloned()
    }

    fn release(&mut self) {
        let min = self.cursors.iter().flatten().min().copied();
        match min {
            Some(min) => {
                while self.base < min && !self.chunks.is_empty() {
                    self.chunks.pop_front();
                    self.base += 1;
                }
            }
            None => {
                self.chunks.clear();
                self.upstream = None;
            }
        }
    }
}

/// Forwards an upstream wake-up to every reader parked on the tee.
#[derive(Default)]
struct TeeWakers {
    slots: Mutex<[Option<Waker>; 2]>,
}

impl TeeWakers {
    fn register(&self, side: usize, w: &Waker) {
        let mut slots = lock(&self.slots);
        match &slots[side] {
            Some(existing) if existing.will_wake(w) => {}
            _ => slots[side] = Some(w.clone()),
        }
    }

    fn wake_side(&self, side: usize) {
        let w = lock(&self.slots)[side].take();
        if let Some(w) = w {
            w.wake();
        }
    }
}

impl ArcWake for TeeWakers {
    fn wake_by_ref(arc_self: &Arc<Self>) {
        let taken: Vec<Waker> = lock(&arc_self.slots).iter_mut().filter_map(Option::take).collect();
        for w in taken {
            w.wake();
        }
    }
}

struct TeeReader {
    shared: Arc<TeeShared>,
    side: usize,
}

impl Stream for TeeReader {
    type Item = Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        let side = this.side;
        let other = 1 - side;
        let mut state = lock(&this.shared.state);

        loop {
            let Some(pos) = state.cursors[side] else {
                return Poll::Ready(None);
            };
            if let Some(chunk) = state.chunk_at(pos) {
                state.cursors[side] = Some(pos + 1);
                state.release();
                return Poll::Ready(Some(chunk.map_err(Error::Body)));
            }

            let Some(upstream) = state.upstream.as_mut() else {
                return Poll::Ready(None);
            };

            this.shared.wakers.register(side, cx.waker());
            let fan_out = waker(this.shared.wakers.clone());
            let mut upstream_cx = Context::from_waker(&fan_out);
            let polled = upstream.as_mut().poll_next(&mut upstream_cx);
            match polled {
                Poll::Ready(Some(item)) => {
                    state.chunks.push_back(item.map_err(|e| e.to_string()));
                    if state.cursors[other].is_some() {
                        drop(state);
                        this.shared.wakers.wake_side(other);
                        state = lock(&this.shared.state);
                    }
                }
                Poll::Ready(None) => {
                    state.upstream = None;
                    drop(state);
                    this.shared.wakers.wake_side(other);
                    state = lock(&this.shared.state);
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

impl Drop for TeeReader {
    fn drop(&mut self) {
        {
            let mut state = lock(&self.shared.state);
            state.cursors[self.side] = None;
            state.release();
        }
        self.shared.wakers.wake_side(1 - self.side);
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
