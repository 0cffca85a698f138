//! Module command client.
//!
//! Each method assembles a command, sends it over the transport and shapes
//! the reply. Builder errors surface before anything is written.

use crate::codec::RedisCodec;
use crate::commands;
use crate::config::ClientConfig;
use crate::error::Result;
use crate::protocol::Frame;
use crate::reply::search::{AggregateResults, AggregateWithCursorResults};
use crate::reply::{self, search as search_reply, timeseries as ts_reply};
use crate::search::{AggregateOptions, CursorOptions};
use crate::timeseries::{
    Compaction, CreateOptions, GetResult, KeySample, MGetOptions, MRangeOptions, RangeOptions,
    RangeResult, Sample, Timestamp,
};
use crate::transport::{Connection, Transport};

/// Search and time-series commands over a [`Transport`].
pub struct ModuleClient<T, K, V> {
    transport: T,
    codec: Box<dyn RedisCodec<K, V>>,
}

impl<K, V> ModuleClient<Connection, K, V> {
    /// Connect to the configured server.
    pub async fn connect(
        config: &ClientConfig,
        codec: impl RedisCodec<K, V> + 'static,
    ) -> Result<Self> {
        let connection = Connection::connect(config).await?;
        Ok(Self::new(connection, codec))
    }
}

impl<T: Transport, K, V> ModuleClient<T, K, V> {
    /// Pair a transport with a codec.
    pub fn new(transport: T, codec: impl RedisCodec<K, V> + 'static) -> Self {
        Self {
            transport,
            codec: Box::new(codec),
        }
    }

    /// The underlying transport.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Consume the client, returning the transport.
    pub fn into_transport(self) -> T {
        self.transport
    }

    // ─────────────────────────────────────────────────────────────────────
    // Time series
    // ─────────────────────────────────────────────────────────────────────

    pub async fn ts_create(&mut self, key: &K, options: &CreateOptions<K, V>) -> Result<String> {
        let command = commands::ts_create(self.codec.as_ref(), key, options)?;
        reply::ok(self.transport.send(command).await?)
    }

    pub async fn ts_alter(&mut self, key: &K, options: &CreateOptions<K, V>) -> Result<String> {
        let command = commands::ts_alter(self.codec.as_ref(), key, options)?;
        reply::ok(self.transport.send(command).await?)
    }

    /// Append a sample, returning its timestamp.
    pub async fn ts_add(
        &mut self,
        key: &K,
        timestamp: Timestamp,
        value: f64,
        options: Option<&CreateOptions<K, V>>,
    ) -> Result<u64> {
        let command = commands::ts_add(self.codec.as_ref(), key, timestamp, value, options)?;
        ts_reply::timestamp(self.transport.send(command).await?)
    }

    /// Append samples to several series. Each sample succeeds or fails on its own.
    pub async fn ts_madd(&mut self, samples: &[KeySample<K>]) -> Result<Vec<Result<u64>>> {
        let command = commands::ts_madd(self.codec.as_ref(), samples)?;
        ts_reply::timestamps(self.transport.send(command).await?)
    }

    pub async fn ts_incrby(
        &mut self,
        key: &K,
        value: f64,
        timestamp: Option<u64>,
        options: Option<&CreateOptions<K, V>>,
    ) -> Result<u64> {
        let command = commands::ts_incrby(self.codec.as_ref(), key, value, timestamp, options)?;
        ts_reply::timestamp(self.transport.send(command).await?)
    }

    pub async fn ts_decrby(
        &mut self,
        key: &K,
        value: f64,
        timestamp: Option<u64>,
        options: Option<&CreateOptions<K, V>>,
    ) -> Result<u64> {
        let command = commands::ts_decrby(self.codec.as_ref(), key, value, timestamp, options)?;
        ts_reply::timestamp(self.transport.send(command).await?)
    }

    pub async fn ts_createrule(
        &mut self,
        source: &K,
        dest: &K,
        compaction: &Compaction,
    ) -> Result<String> {
        let command = commands::ts_createrule(self.codec.as_ref(), source, dest, compaction)?;
        reply::ok(self.transport.send(command).await?)
    }

    pub async fn ts_deleterule(&mut self, source: &K, dest: &K) -> Result<String> {
        let command = commands::ts_deleterule(self.codec.as_ref(), source, dest);
        reply::ok(self.transport.send(command).await?)
    }

    pub async fn ts_range(&mut self, key: &K, options: &RangeOptions) -> Result<Vec<Sample>> {
        let command = commands::ts_range(self.codec.as_ref(), key, options)?;
        ts_reply::samples(self.transport.send(command).await?)
    }

    pub async fn ts_revrange(&mut self, key: &K, options: &RangeOptions) -> Result<Vec<Sample>> {
        let command = commands::ts_revrange(self.codec.as_ref(), key, options)?;
        ts_reply::samples(self.transport.send(command).await?)
    }

    pub async fn ts_mrange(
        &mut self,
        options: &MRangeOptions<K, V>,
    ) -> Result<Vec<RangeResult<K, V>>> {
        let command = commands::ts_mrange(self.codec.as_ref(), options)?;
        let frame = self.transport.send(command).await?;
        ts_reply::range_results(self.codec.as_ref(), frame)
    }

    pub async fn ts_mrevrange(
        &mut self,
        options: &MRangeOptions<K, V>,
    ) -> Result<Vec<RangeResult<K, V>>> {
        let command = commands::ts_mrevrange(self.codec.as_ref(), options)?;
        let frame = self.transport.send(command).await?;
        ts_reply::range_results(self.codec.as_ref(), frame)
    }

    /// Last sample of a series; `None` when it has none.
    pub async fn ts_get(&mut self, key: &K, latest: bool) -> Result<Option<Sample>> {
        let command = commands::ts_get(self.codec.as_ref(), key, latest);
        ts_reply::sample(self.transport.send(command).await?)
    }

    pub async fn ts_mget(&mut self, options: &MGetOptions<K, V>) -> Result<Vec<GetResult<K, V>>> {
        let command = commands::ts_mget(self.codec.as_ref(), options)?;
        let frame = self.transport.send(command).await?;
        ts_reply::get_results(self.codec.as_ref(), frame)
    }

    pub async fn ts_info(&mut self, key: &K, debug: bool) -> Result<Vec<(String, Frame)>> {
        let command = commands::ts_info(self.codec.as_ref(), key, debug);
        ts_reply::info(self.transport.send(command).await?)
    }

    /// Delete samples in `[from, to]`, returning how many were removed.
    pub async fn ts_del(&mut self, key: &K, from: u64, to: u64) -> Result<u64> {
        let command = commands::ts_del(self.codec.as_ref(), key, from, to)?;
        reply::count(self.transport.send(command).await?)
    }

    pub async fn ts_queryindex(&mut self, filters: &[V]) -> Result<Vec<K>> {
        let command = commands::ts_queryindex(self.codec.as_ref(), filters)?;
        let frame = self.transport.send(command).await?;
        ts_reply::keys(self.codec.as_ref(), frame)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Search
    // ─────────────────────────────────────────────────────────────────────

    pub async fn ft_aggregate(
        &mut self,
        index: &K,
        query: &V,
        options: &AggregateOptions<K, V>,
    ) -> Result<AggregateResults<K, V>> {
        let command = commands::ft_aggregate(self.codec.as_ref(), index, query, options)?;
        let frame = self.transport.send(command).await?;
        search_reply::aggregate_results(self.codec.as_ref(), frame)
    }

    pub async fn ft_aggregate_with_cursor(
        &mut self,
        index: &K,
        query: &V,
        options: &AggregateOptions<K, V>,
        cursor: &CursorOptions,
    ) -> Result<AggregateWithCursorResults<K, V>> {
        let command =
            commands::ft_aggregate_with_cursor(self.codec.as_ref(), index, query, options, cursor)?;
        let frame = self.transport.send(command).await?;
        search_reply::aggregate_with_cursor_results(self.codec.as_ref(), frame)
    }

    /// Next batch of a cursor. A returned cursor of `0` means it is exhausted.
    pub async fn ft_cursor_read(
        &mut self,
        index: &K,
        cursor: u64,
        count: Option<u64>,
    ) -> Result<AggregateWithCursorResults<K, V>> {
        let command = commands::ft_cursor_read(self.codec.as_ref(), index, cursor, count);
        let frame = self.transport.send(command).await?;
        search_reply::aggregate_with_cursor_results(self.codec.as_ref(), frame)
    }

    pub async fn ft_cursor_del(&mut self, index: &K, cursor: u64) -> Result<String> {
        let command = commands::ft_cursor_del(self.codec.as_ref(), index, cursor);
        reply::ok(self.transport.send(command).await?)
    }
}

impl<T: std::fmt::Debug, K, V> std::fmt::Debug for ModuleClient<T, K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleClient")
            .field("transport", &self.transport)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::StringCodec;
    use crate::commands::Command;
    use crate::error::Error;
    use crate::timeseries::LabelFilter;
    use bytes::Bytes;
    use std::collections::VecDeque;

    /// Records commands and answers with scripted frames.
    #[derive(Debug, Default)]
    struct Scripted {
        sent: Vec<String>,
        replies: VecDeque<Frame>,
    }

    impl Transport for Scripted {
        async fn send(&mut self, command: Command) -> Result<Frame> {
            self.sent.push(command.to_string());
            match self.replies.pop_front() {
                Some(Frame::Error(msg)) => Err(Error::Server(msg)),
                Some(frame) => Ok(frame),
                None => Err(Error::Connection("no scripted reply".to_string())),
            }
        }
    }

    fn client(replies: Vec<Frame>) -> ModuleClient<Scripted, String, String> {
        let transport = Scripted {
            sent: Vec::new(),
            replies: replies.into(),
        };
        ModuleClient::new(transport, StringCodec)
    }

    fn bulk(s: &str) -> Frame {
        Frame::Bulk(Bytes::copy_from_slice(s.as_bytes()))
    }

    #[tokio::test]
    async fn test_ts_add_round_trip() {
        let mut client = client(vec![Frame::Integer(1_000)]);
        let ts = client
            .ts_add(&"temp:1".to_string(), Timestamp::At(1_000), 21.5, None)
            .await
            .unwrap();
        assert_eq!(ts, 1_000);
        assert_eq!(client.transport_mut().sent, ["TS.ADD temp:1 1000 21.5"]);
    }

    #[tokio::test]
    async fn test_ts_mget_shapes_reply() {
        let reply = Frame::Array(vec![Frame::Array(vec![
            bulk("temp:1"),
            Frame::Array(Vec::new()),
            Frame::Array(vec![Frame::Integer(5), bulk("2.5")]),
        ])]);
        let mut client = client(vec![reply]);
        let options = MGetOptions::builder()
            .label_filters([LabelFilter::equals("type", "temp")])
            .build()
            .unwrap();
        let results = client.ts_mget(&options).await.unwrap();
        assert_eq!(results[0].key, "temp:1");
        assert_eq!(results[0].sample, Some(Sample::new(5, 2.5)));
    }

    #[tokio::test]
    async fn test_usage_error_sends_nothing() {
        let mut client = client(Vec::new());
        let err = client.ts_queryindex(&[]).await.unwrap_err();
        assert!(err.is_usage_error());
        assert!(client.transport_mut().sent.is_empty());
    }

    #[tokio::test]
    async fn test_server_error_propagates() {
        let mut client = client(vec![Frame::error("Unknown Index name")]);
        let err = client
            .ft_cursor_del(&"idx".to_string(), 7)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Server(msg) if msg == "Unknown Index name"));
    }
}
