use super::{
    errors::SpawnError,
    model::JoinOrdering,
    result::SpawnResult,
};
use std::{
    fmt,
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::{
    sync::oneshot::{self, error::TryRecvError},
    time::Duration,
};


/// Отложенная задача без аргументов: всё нужное уже захвачено замыканием.
/// Возвращает `false`, если вызываемый код запаниковал.
pub(crate) type Task = Box<dyn FnOnce() -> bool + Send + 'static>;


/// Одноразовый handle на результат задачи.
///
/// Результат забирается ровно один раз: `join`, `try_join`, `await_timeout`
/// и `.await` потребляют handle. Если задача была уничтожена, так и не
/// выполнившись, handle отдаёт `SpawnError::Cancelled`.
pub struct JoinHandle<T> {
    receiver: oneshot::Receiver<SpawnResult<T>>,
}

impl<T> JoinHandle<T> {

    pub(crate) fn new(receiver: oneshot::Receiver<SpawnResult<T>>) -> Self {
        Self { receiver }
    }

    /// Блокирует текущий поток до появления результата.
    ///
    /// Можно вызывать как вне async-рантайма, так и внутри него
    /// (но тогда блокируется поток рантайма).
    pub fn join(self) -> SpawnResult<T> {
        futures::executor::block_on(self)
    }

    /// Неблокирующая проверка. Пока задача не завершена, handle возвращается обратно.
    pub fn try_join(mut self) -> Result<SpawnResult<T>, Self> {
        match self.receiver.try_recv() {
            Ok(result) => Ok(result),
            Err(TryRecvError::Empty) => Err(self),
            Err(TryRecvError::Closed) => Ok(Err(SpawnError::Cancelled)),
        }
    }

    /// Требует tokio-рантайм с включённым таймером.
    pub async fn await_timeout(self, timeout: Duration) -> SpawnResult<T> {
        match tokio::time::timeout(timeout, self.receiver).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(SpawnError::Cancelled),
            Err(_) => Err(SpawnError::Timeout),
        }
    }
}

impl<T> Future for JoinHandle<T> {
    type Output = SpawnResult<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match Pin::new(&mut this.receiver).poll(cx) {
            Poll::Ready(res) => Poll::Ready(res.unwrap_or(Err(SpawnError::Cancelled))),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<T> fmt::Debug for JoinHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JoinHandle").finish_non_exhaustive()
    }
}


/// Дожидается всех handles.
///
/// `Ordered` сохраняет порядок handles, `UnOrdered` отдаёт результаты по мере готовности.
pub async fn join_handles<T>(handles: Vec<JoinHandle<T>>, ordering: JoinOrdering) -> Vec<SpawnResult<T>> {
    if handles.is_empty() {
        return Vec::new();
    }

    match ordering {
        JoinOrdering::Ordered => futures::future::join_all(handles).await,
        JoinOrdering::UnOrdered => {
            let len = handles.len();
            let mut pending = FuturesUnordered::from_iter(handles);
            let mut results = Vec::with_capacity(len);

            while let Some(result) = pending.next().await {
                results.push(result);
            }

            results
        }
    }
}
