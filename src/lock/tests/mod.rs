mod tests_handoff;
