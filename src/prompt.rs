/// System and user halves of a completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

pub fn sql_generation(ddl: &str, question: &str) -> Prompt {
    let system = format!(
        r#"You are a master at SQL.
Your job is to write SQL queries to answer user requests.
Within the <ddl> tags is the SQL schema for a database.
Study it carefully in order to answer the user queries as accurately as possible.
Use all skills available to you to do this.
<ddl>{ddl}</ddl>
If necessary, you may break the response down into multiple steps for the user to execute.
If you do not believe that the data exists to answer the user question, do not try.
Only write SQL that you believe execute within the provided DDL.
Ensure that your responses are compatible with MYSQL Global setting value ONLY_FULL_GROUP_BY.
Strictly structure your responses to adhere to the following JSON structure:
{{
  "sql": [An array of SQL statements necessary to answer the user request. There should be 1 or more values in this list.],
  "rationale": A string with your rationale for what you have provided.,
  "valid": A 1 if you believe the query can be run against the provided ddl or a 0 if you believe that the data does not exist.
}}"#
    );

    Prompt {
        system,
        user: question.to_string(),
    }
}

/// `data` is the table the user was shown, as plain text.
pub fn chart_generation(question: &str, data: &str) -> Prompt {
    let system = r#"You turn query results into bar chart parameters.
Pick one column for the bar labels and one numeric column for the bar values.
Strictly structure your responses to adhere to the following JSON structure:
{
  "labels": [An array of strings, one per bar.],
  "data": [An array of numbers, one per label, in the same order.],
  "xlabel": A string naming the label axis.,
  "ylabel": A string naming the value axis.,
  "title": A short chart title.
}"#
    .to_string();

    let user = format!("Question: {question}\nData:\n{data}");

    Prompt { system, user }
}
