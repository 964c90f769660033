mod tests_index_all;
