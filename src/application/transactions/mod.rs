pub mod storage_transaction;
