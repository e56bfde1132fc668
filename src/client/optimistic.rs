use std::future::Future;

/// A view-model value that can be mutated ahead of server confirmation.
///
/// State machine per value: `Settled(v)` → `Optimistic(v')` on apply →
/// `Settled(v')` (or the server's value) on commit, or back to `Settled(v)`
/// on rollback. A failed attempt is terminal; retrying takes a fresh apply.
#[derive(Debug, Clone)]
pub struct Optimistic<T: Clone> {
    current: T,
    prior: Option<T>,
}

impl<T: Clone> Optimistic<T> {
    pub fn new(value: T) -> Optimistic<T> {
        Optimistic {
            current: value,
            prior: None,
        }
    }

    pub fn get(&self) -> &T {
        &self.current
    }

    pub fn is_settled(&self) -> bool {
        self.prior.is_none()
    }

    /// Snapshots the settled value and mutates in place. A second apply while
    /// already optimistic keeps the original snapshot, so a rollback always
    /// lands on the last settled value.
    pub fn apply(&mut self, f: impl FnOnce(&mut T)) {
        if self.prior.is_none() {
            self.prior = Some(self.current.clone());
        }
        f(&mut self.current);
    }

    /// Settles the optimistic value, optionally overwriting it with the
    /// server's authoritative response.
    pub fn commit(&mut self, server: Option<T>) {
        if let Some(server) = server {
            self.current = server;
        }
        self.prior = None;
    }

    /// Restores the snapshot taken by `apply`. A no-op when settled.
    pub fn rollback(&mut self) {
        if let Some(prior) = self.prior.take() {
            self.current = prior;
        }
    }
}

/// Runs one optimistic mutation: applies the presumed result, awaits the
/// network call, commits on success (taking the server's value when it
/// returns one) and rolls back on failure.
pub async fn mutate<T, E, F, Fut>(
    cell: &mut Optimistic<T>,
    apply: impl FnOnce(&mut T),
    op: F,
) -> Result<(), E>
where
    T: Clone,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Option<T>, E>>,
{
    cell.apply(apply);
    match op().await {
        Ok(server) => {
            cell.commit(server);
            Ok(())
        }
        Err(error) => {
            cell.rollback();
            Err(error)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct LikeView {
        liked: bool,
        like_count: i64,
    }

    fn view() -> LikeView {
        LikeView {
            liked: false,
            like_count: 3,
        }
    }

    #[tokio::test]
    async fn successful_mutation_settles_on_optimistic_value() {
        let mut cell = Optimistic::new(view());
        let result = mutate(
            &mut cell,
            |v| {
                v.liked = true;
                v.like_count += 1;
            },
            || async { Ok::<_, ()>(None) },
        )
        .await;
        assert!(result.is_ok());
        assert!(cell.is_settled());
        assert_eq!(
            *cell.get(),
            LikeView {
                liked: true,
                like_count: 4
            }
        );
    }

    #[tokio::test]
    async fn server_response_overwrites_the_guess() {
        // The server may legitimately disagree with the optimistic guess,
        // e.g. when another session toggled the same relation first.
        let mut cell = Optimistic::new(view());
        mutate(
            &mut cell,
            |v| {
                v.liked = true;
                v.like_count += 1;
            },
            || async {
                Ok::<_, ()>(Some(LikeView {
                    liked: true,
                    like_count: 7,
                }))
            },
        )
        .await
        .unwrap();
        assert_eq!(cell.get().like_count, 7);
    }

    #[tokio::test]
    async fn failed_mutation_rolls_back_to_the_exact_prior_state() {
        let before = view();
        let mut cell = Optimistic::new(before.clone());
        let result = mutate(
            &mut cell,
            |v| {
                v.liked = true;
                v.like_count += 1;
            },
            || async { Err::<Option<LikeView>, _>("network down") },
        )
        .await;
        assert!(result.is_err());
        assert!(cell.is_settled());
        assert_eq!(*cell.get(), before);
    }

    #[test]
    fn double_apply_keeps_the_original_snapshot() {
        let before = view();
        let mut cell = Optimistic::new(before.clone());
        cell.apply(|v| v.like_count += 1);
        cell.apply(|v| v.like_count += 1);
        cell.rollback();
        assert_eq!(*cell.get(), before);
    }

    #[test]
    fn rollback_when_settled_is_a_no_op() {
        let mut cell = Optimistic::new(view());
        cell.rollback();
        assert_eq!(*cell.get(), view());
    }
}
