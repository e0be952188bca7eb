//! 画面間の位置情報受け渡し
//!
//! 位置選択画面から投稿画面へ座標を返す一回限りのチャネル。
//! 受け取りは `PendingLocation::take` で一度だけ成立する。

use spot_share_common::LocationPoint;
use tokio::sync::oneshot;
use tracing::debug;

/// 位置選択画面側の送信口
#[derive(Debug)]
pub struct LocationReturn {
    tx: oneshot::Sender<LocationPoint>,
}

/// 投稿画面側の受信口
#[derive(Debug)]
pub struct PendingLocation {
    rx: oneshot::Receiver<LocationPoint>,
}

pub fn location_route() -> (LocationReturn, PendingLocation) {
    let (tx, rx) = oneshot::channel();
    (LocationReturn { tx }, PendingLocation { rx })
}

impl LocationReturn {
    /// 座標を返して画面を閉じる（受信側が既に破棄されていれば何もしない）
    pub fn send(self, point: LocationPoint) {
        if self.tx.send(point).is_err() {
            debug!("location return dropped: host no longer waiting");
        }
    }
}

/// 受信口の状態
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Arrival {
    /// 位置選択画面がまだ開いている
    Waiting,
    Arrived(LocationPoint),
    /// 座標なしで閉じられた、または受け取り済み
    Closed,
}

impl PendingLocation {
    pub fn poll(&mut self) -> Arrival {
        match self.rx.try_recv() {
            Ok(point) => Arrival::Arrived(point),
            Err(oneshot::error::TryRecvError::Empty) => Arrival::Waiting,
            Err(oneshot::error::TryRecvError::Closed) => Arrival::Closed,
        }
    }

    /// 届いた座標を一度だけ取り出す
    pub fn take(&mut self) -> Option<LocationPoint> {
        match self.poll() {
            Arrival::Arrived(point) => Some(point),
            _ => None,
        }
    }
}
