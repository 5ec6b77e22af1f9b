use super::{Entry, SORT_THRESHOLD, SORT_THREADS};

/// Sort `entries` ascending by distance, in place. Below [`SORT_THRESHOLD`] elements
/// this is a plain shellsort; at or above it, a `SORT_THREADS`-way parallel merge
/// sort: split into `SORT_THREADS` chunks, shellsort each chunk on its own thread,
/// then k-way merge the sorted chunks back together.
///
/// Spawning a sort worker thread is treated as an unrecoverable environmental
/// failure rather than threaded through as a `Result` - a thread that can't be
/// created leaves the process in a state nothing downstream can meaningfully
/// recover from.
pub(crate) fn sort_entries<T, D>(entries: &mut Vec<Entry<T, D>>)
where
    T: Send,
    D: PartialOrd + Send,
{
    if entries.len() < SORT_THRESHOLD {
        shellsort(entries);
        return;
    }

    let mut chunks = split_into_chunks(std::mem::take(entries), SORT_THREADS);

    std::thread::scope(|scope| {
        // The calling thread sorts the last chunk itself; the rest get a worker.
        let own_chunk = chunks.pop();
        let mut handles = Vec::with_capacity(chunks.len());
        for mut chunk in chunks {
            handles.push(scope.spawn(move || {
                shellsort(&mut chunk);
                chunk
            }));
        }

        let mut sorted_chunks: Vec<Vec<Entry<T, D>>> = Vec::with_capacity(handles.len() + 1);
        if let Some(mut chunk) = own_chunk {
            shellsort(&mut chunk);
            sorted_chunks.push(chunk);
        }
        for handle in handles {
            sorted_chunks.push(handle.join().expect("sort worker thread panicked"));
        }

        *entries = k_way_merge(sorted_chunks);
    });
}

fn shellsort<T, D: PartialOrd>(entries: &mut [Entry<T, D>]) {
    let n = entries.len();
    if n < 2 {
        return;
    }

    let mut gap = n / 2;
    while gap > 0 {
        for i in gap..n {
            let mut j = i;
            while j >= gap && entries[j - gap].distance > entries[j].distance {
                entries.swap(j - gap, j);
                j -= gap;
            }
        }
        gap /= 2;
    }
}

fn split_into_chunks<T, D>(mut entries: Vec<Entry<T, D>>, num_chunks: usize) -> Vec<Vec<Entry<T, D>>> {
    if entries.is_empty() {
        return Vec::new();
    }

    let chunk_len = (entries.len() + num_chunks - 1) / num_chunks;
    let mut chunks = Vec::with_capacity(num_chunks);

    // Split from the back repeatedly so each `split_off` is O(remaining) and the
    // front chunk (handed to the caller's own thread) keeps its original order.
    while entries.len() > chunk_len {
        let split_at = entries.len() - chunk_len;
        let tail = entries.split_off(split_at);
        chunks.push(tail);
    }
    chunks.push(entries);
    chunks.reverse();
    chunks
}

fn k_way_merge<T, D: PartialOrd>(chunks: Vec<Vec<Entry<T, D>>>) -> Vec<Entry<T, D>> {
    let total: usize = chunks.iter().map(|c| c.len()).sum();
    let mut runs: Vec<std::vec::IntoIter<Entry<T, D>>> =
        chunks.into_iter().map(|c| c.into_iter()).collect();
    let mut heads: Vec<Option<Entry<T, D>>> = runs.iter_mut().map(|r| r.next()).collect();

    let mut merged = Vec::with_capacity(total);
    loop {
        let mut min_idx: Option<usize> = None;
        for (i, head) in heads.iter().enumerate() {
            if let Some(h) = head {
                let is_new_min = match min_idx {
                    None => true,
                    Some(m) => h.distance < heads[m].as_ref().expect("m has a head").distance,
                };
                if is_new_min {
                    min_idx = Some(i);
                }
            }
        }

        match min_idx {
            None => break,
            Some(i) => {
                let entry = heads[i].take().expect("min_idx always has a head");
                merged.push(entry);
                heads[i] = runs[i].next();
            }
        }
    }

    merged
}
