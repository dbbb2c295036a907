// Local git access: repository probing and staged/unstaged diffs.

pub mod worker;
